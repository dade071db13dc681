// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definition for service principal backed Git credentials.
//!
//! A [`ServicePrincipalBinding`] names an app registration (client id + tenant), points
//! at the Kubernetes Secret holding its client secret, and says which Git repository
//! the resulting access token is for. The controller turns it into a derived Secret in
//! the ArgoCD namespace and keeps the token fresh.
//!
//! # Example
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

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a key inside a Secret in the resource's own namespace.
///
/// Both fields are required for a reconciliation to proceed. They are optional in
/// the schema so a malformed reference is reported on the resource instead of being
/// rejected by the API server without explanation.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretRef {
    /// Name of the Secret holding the client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Key within the Secret's data whose value is the client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl ClientSecretRef {
    /// `true` when the reference carries no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.key.is_none()
    }
}

/// `ServicePrincipalBinding` exchanges a service principal's client secret for an
/// OAuth2 access token and publishes it as an ArgoCD repository secret.
///
/// # Example
///
/// ```yaml
/// apiVersion: k8sware.com/v1
/// kind: ServicePrincipalBinding
/// metadata:
///   name: demo
///   namespace: team-a
/// spec:
///   clientId: 00000000-0000-0000-0000-000000000001
///   clientSecretRef:
///     name: sp-credentials
///     key: clientSecret
///   tenantId: contoso.onmicrosoft.com
///   gitUrl: https://dev.azure.com/contoso/project/_git/repo
///   secretType: repository
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[kube(
    group = "k8sware.com",
    version = "v1",
    kind = "ServicePrincipalBinding",
    plural = "argocdsp",
    shortname = "argocdsp",
    namespaced,
    doc = "ServicePrincipalBinding turns a service principal's client secret into a short-lived Git credential secret for ArgoCD, refreshed before the access token expires."
)]
#[kube(status = "ServicePrincipalBindingStatus")]
#[kube(printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#)]
#[kube(printcolumn = r#"{"name":"Secret","type":"string","jsonPath":".status.secretName"}"#)]
#[kube(printcolumn = r#"{"name":"Last Refresh","type":"date","jsonPath":".status.lastRefreshTime"}"#)]
#[kube(printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipalBindingSpec {
    /// Application (client) id of the app registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Where the client secret lives, in this resource's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_ref: Option<ClientSecretRef>,

    /// Identity provider tenant (id or verified domain).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Repository URL the credential is for. Written to the derived secret as `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_url: Option<String>,

    /// Value of the `argocd.argoproj.io/secret-type` label (e.g. `repository`, `repo-creds`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_type: Option<String>,
}

impl ServicePrincipalBindingSpec {
    /// Names (as written in the manifest) of the required fields that are absent or empty.
    ///
    /// A `clientSecretRef` with no entries counts as absent; a partially filled
    /// reference is left to the credential resolver to reject.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        fn blank(value: Option<&String>) -> bool {
            value.is_none_or(|v| v.trim().is_empty())
        }

        let mut missing = Vec::new();
        if blank(self.client_id.as_ref()) {
            missing.push("clientId");
        }
        if self
            .client_secret_ref
            .as_ref()
            .is_none_or(ClientSecretRef::is_empty)
        {
            missing.push("clientSecretRef");
        }
        if blank(self.tenant_id.as_ref()) {
            missing.push("tenantId");
        }
        if blank(self.git_url.as_ref()) {
            missing.push("gitUrl");
        }
        if blank(self.secret_type.as_ref()) {
            missing.push("secretType");
        }
        missing
    }
}

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. This controller only reports `Ready`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// `ServicePrincipalBinding` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicePrincipalBindingStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Name of the derived secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    /// Namespace of the derived secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_namespace: Option<String>,

    /// Last successful token refresh (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh_time: Option<String>,

    /// When the refresh timer fires next (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_refresh_time: Option<String>,

    /// Expiry reported by the identity provider for the current token (RFC3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<String>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
