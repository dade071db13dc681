// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for `ServicePrincipalBinding` resources.
//!
//! A binding names an Azure service principal and a Git repository. The
//! reconciler turns it into an Argo CD repository credential secret:
//!
//! 1. **Validate** - all five spec fields must be present
//! 2. **Resolve** - read the client secret from the referenced `Secret`
//! 3. **Exchange** - run the OAuth2 client-credentials flow for an access token
//! 4. **Publish** - create or replace the derived secret in the deploy namespace
//! 5. **Status** - record the outcome and the next refresh time
//!
//! Deletion removes the derived secret before the finalizer is released.
//!
//! # Example
//!
//! ```rust,no_run
//! use argocd_sp_operator::config::ControllerConfig;
//! use argocd_sp_operator::events::KubeEventPublisher;
//! use argocd_sp_operator::reconcilers::Reconciler;
//! use argocd_sp_operator::secret_store::KubeSecretStore;
//! use argocd_sp_operator::token::ClientCredentialsExchanger;
//! use std::sync::Arc;
//!
//! # async fn build(client: kube::Client) -> anyhow::Result<Reconciler> {
//! let config = ControllerConfig::default();
//! let tokens = ClientCredentialsExchanger::new(&config)?;
//! Ok(Reconciler::new(
//!     config,
//!     Arc::new(KubeSecretStore::new(client.clone())),
//!     Arc::new(tokens),
//!     Arc::new(KubeEventPublisher::new(client)),
//! ))
//! # }
//! ```

pub mod credentials;
pub mod derived_secret;
pub mod finalizers;
pub mod locks;
pub mod service_principal;
pub mod status;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_support;

pub use service_principal::{Outcome, Reconciler, Reconciliation, SyncedSecret};
pub use trigger::Trigger;
