// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # argocd-sp-operator - Service principal credentials for Argo CD
//!
//! A Kubernetes operator that keeps Argo CD repository credentials fresh for
//! Git servers that authenticate with Azure service principals.
//!
//! ## Overview
//!
//! Each `ServicePrincipalBinding` (`k8sware.com/v1`) names an app registration,
//! a `Secret` holding its client secret, and a Git URL. The operator:
//!
//! - Exchanges the client secret for an access token (OAuth2 client credentials)
//! - Publishes the token as an Argo CD repository secret in the `argocd` namespace
//! - Refreshes the token before it expires
//! - Removes the repository secret when the binding is deleted
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - Reconciliation logic and its building blocks
//! - [`token`] - OAuth2 client-credentials exchange
//! - [`secret_store`] - Kubernetes `Secret` access behind a trait
//! - [`events`] - Kubernetes event publishing
//! - [`metrics`] - Prometheus metrics
//! - [`server`] - HTTP endpoints for metrics and health checks
//! - [`config`] - Command-line and environment configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use argocd_sp_operator::crd::{ClientSecretRef, ServicePrincipalBindingSpec};
//!
//! let spec = ServicePrincipalBindingSpec {
//!     client_id: Some("00000000-0000-0000-0000-000000000001".to_string()),
//!     client_secret_ref: Some(ClientSecretRef {
//!         name: Some("sp-credentials".to_string()),
//!         key: Some("clientSecret".to_string()),
//!     }),
//!     tenant_id: Some("contoso.onmicrosoft.com".to_string()),
//!     git_url: Some("https://dev.azure.com/contoso/project/_git/repo".to_string()),
//!     secret_type: Some("repository".to_string()),
//! };
//! assert!(spec.missing_fields().is_empty());
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod events;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod secret_store;
pub mod server;
pub mod status_reasons;
pub mod token;
