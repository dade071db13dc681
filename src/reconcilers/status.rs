// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `ServicePrincipalBinding` resources.
//!
//! # Condition Format
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (always `Ready` here)
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the condition changed
//!
//! # Example
//!
//! ```rust,no_run
//! use argocd_sp_operator::reconcilers::status::create_condition;
//!
//! let condition = create_condition(
//!     "Ready",
//!     "True",
//!     "SecretSynced",
//!     "Secret argocd/demo-team-a-argocd-token replaced"
//! );
//! ```

use crate::crd::{Condition, ServicePrincipalBinding, ServicePrincipalBindingStatus};
use crate::status_reasons::{CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_TYPE_READY};
use chrono::{DateTime, Utc};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Example
///
/// ```rust,no_run
/// # use argocd_sp_operator::reconcilers::status::create_condition;
/// let condition = create_condition("Ready", "False", "TokenError", "HTTP 401");
/// assert_eq!(condition.r#type, "Ready");
/// assert_eq!(condition.status, "False");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// The `lastTransitionTime` is preserved when the status value is unchanged.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Facts about a successful sync that end up in the status.
#[derive(Debug, Clone)]
pub struct SyncReport<'a> {
    pub reason: &'a str,
    pub message: &'a str,
    pub secret_name: &'a str,
    pub secret_namespace: &'a str,
    pub next_refresh_time: String,
    pub token_expires_at: Option<String>,
}

/// Status after a successful sync at `now`.
#[must_use]
pub fn synced_status(
    sp: &ServicePrincipalBinding,
    report: &SyncReport<'_>,
    now: DateTime<Utc>,
) -> ServicePrincipalBindingStatus {
    let mut status = sp.status.clone().unwrap_or_default();
    update_condition_in_memory(
        &mut status.conditions,
        CONDITION_TYPE_READY,
        CONDITION_STATUS_TRUE,
        report.reason,
        report.message,
    );
    status.observed_generation = sp.metadata.generation;
    status.secret_name = Some(report.secret_name.to_string());
    status.secret_namespace = Some(report.secret_namespace.to_string());
    status.last_refresh_time = Some(now.to_rfc3339());
    status.next_refresh_time = Some(report.next_refresh_time.clone());
    status.token_expires_at.clone_from(&report.token_expires_at);
    status
}

/// Status after a failed sync. Previous secret and refresh details are kept.
#[must_use]
pub fn failed_status(
    sp: &ServicePrincipalBinding,
    reason: &str,
    message: &str,
    next_refresh_time: String,
) -> ServicePrincipalBindingStatus {
    let mut status = sp.status.clone().unwrap_or_default();
    update_condition_in_memory(
        &mut status.conditions,
        CONDITION_TYPE_READY,
        CONDITION_STATUS_FALSE,
        reason,
        message,
    );
    status.observed_generation = sp.metadata.generation;
    status.next_refresh_time = Some(next_refresh_time);
    status
}

/// Build the merge patch body for `status`.
///
/// An absent token expiry is sent as an explicit `null` so a merge patch
/// clears any expiry left over from an earlier token.
#[must_use]
pub fn status_patch(status: &ServicePrincipalBindingStatus) -> serde_json::Value {
    let mut patch = json!({ "status": status });
    if status.token_expires_at.is_none() {
        if let Some(body) = patch["status"].as_object_mut() {
            body.insert("tokenExpiresAt".to_string(), serde_json::Value::Null);
        }
    }
    patch
}

/// Write `status` to the resource's status subresource with a merge patch.
///
/// # Errors
///
/// Returns an error if the Kubernetes API call fails.
pub async fn patch_status(
    client: &Client,
    sp: &ServicePrincipalBinding,
    status: &ServicePrincipalBindingStatus,
) -> Result<(), kube::Error> {
    let namespace = sp.namespace().unwrap_or_default();
    let name = sp.name_any();
    let api: Api<ServicePrincipalBinding> = Api::namespaced(client.clone(), &namespace);

    let patch = status_patch(status);
    api.patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;

    debug!(
        "Updated ServicePrincipalBinding {}/{} status: next refresh at {:?}",
        namespace, name, status.next_refresh_time
    );
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
