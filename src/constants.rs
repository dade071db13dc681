// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the ArgoCD service principal operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance. The values in the
//! "Token Exchange" and "Refresh Timer" sections are the defaults for
//! [`ControllerConfig`](crate::config::ControllerConfig) and can be overridden at startup.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the `ServicePrincipalBinding` CRD
pub const API_GROUP: &str = "k8sware.com";

/// API version for the `ServicePrincipalBinding` CRD
pub const API_VERSION: &str = "v1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "k8sware.com/v1";

/// Kind name for `ServicePrincipalBinding` resource
pub const KIND_SERVICE_PRINCIPAL_BINDING: &str = "ServicePrincipalBinding";

/// Controller name reported on Kubernetes Events and used as field manager
pub const CONTROLLER_NAME: &str = "argocd-sp-operator";

// ============================================================================
// Derived Secret Constants
// ============================================================================

/// Namespace the GitOps tool reads repository credentials from
pub const DEFAULT_DEPLOY_NAMESPACE: &str = "argocd";

/// Suffix appended to every derived secret name
pub const DERIVED_SECRET_SUFFIX: &str = "token";

/// Kubernetes Secret type of the derived secret
pub const DERIVED_SECRET_TYPE: &str = "Opaque";

/// Payload key holding the access token
pub const SECRET_KEY_PASSWORD: &str = "password";

/// Payload key holding the Git repository URL
pub const SECRET_KEY_URL: &str = "url";

/// Payload key holding the project (the owning resource's namespace)
pub const SECRET_KEY_PROJECT: &str = "project";

// ============================================================================
// Token Exchange Constants
// ============================================================================

/// Identity provider authority host; the tenant and token path are appended
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Token endpoint path below `{authority}/{tenantId}`
pub const TOKEN_ENDPOINT_PATH: &str = "oauth2/v2.0/token";

/// OAuth2 grant used for every exchange
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

/// Scope of the Azure DevOps resource the access token is issued for
pub const DEFAULT_TOKEN_SCOPE: &str = "499b84ac-1321-427f-aa17-267ca6975798/.default";

/// Timeout for a single token request (60 seconds)
pub const DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Refresh Timer Constants
// ============================================================================

/// Interval between token refreshes, shorter than the ~3600s token lifetime
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3500;

/// Delay before the first timer-driven refresh, and the shortest refresh ever scheduled
pub const DEFAULT_INITIAL_DELAY_SECS: u64 = 10;

/// Window in which bursts of resource events are coalesced into one reconciliation
pub const DEFAULT_IDLE_SECS: u64 = 10;

/// Safety margin subtracted from a provider-reported token lifetime
pub const DEFAULT_TOKEN_EXPIRY_SKEW_SECS: u64 = 100;

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Re-attempt delay carried by retryable failures (10 seconds)
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 10;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
