// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Condition and event reasons for `ServicePrincipalBinding` resources.
//!
//! Reasons are programmatic identifiers in CamelCase. The same constant is used for the
//! `Ready` condition on the resource and for the Kubernetes Event emitted alongside it,
//! so `kubectl describe` and `kubectl get argocdsp -o yaml` tell the same story.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: SecretError
//!       message: "Failed to get secret team-a/sp-credentials: secret not found"
//!   secretName: demo-team-a-argocd-token
//! ```

// ============================================================================
// Condition Types
// ============================================================================

/// The single condition type reported by this controller.
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Condition status value for a healthy resource.
pub const CONDITION_STATUS_TRUE: &str = "True";

/// Condition status value for a failing resource.
pub const CONDITION_STATUS_FALSE: &str = "False";

// ============================================================================
// Success Reasons
// ============================================================================

/// The derived secret holds a freshly exchanged token.
pub const REASON_SECRET_SYNCED: &str = "SecretSynced";

/// The derived secret was deleted along with its owning resource.
pub const REASON_DELETED_SECRET: &str = "DeletedSecret";

/// The derived secret was already gone when the owning resource was deleted.
///
/// Informational only: deleting an absent secret is not an error.
pub const REASON_SECRET_NOT_FOUND: &str = "SecretNotFound";

// ============================================================================
// Failure Reasons
// ============================================================================

/// One of `clientId`, `clientSecretRef`, `tenantId`, `gitUrl`, `secretType` is missing.
pub const REASON_INVALID_SPEC: &str = "InvalidSpec";

/// The client secret could not be read.
///
/// Covers a malformed `clientSecretRef` (permanent) as well as a missing or
/// unreachable Secret (retryable).
pub const REASON_SECRET_ERROR: &str = "SecretError";

/// No usable access token could be obtained.
///
/// Covers an empty client secret and every failure of the token exchange.
pub const REASON_TOKEN_ERROR: &str = "TokenError";

/// The derived secret could not be created or replaced.
pub const REASON_SECRET_WRITE_FAILED: &str = "SecretWriteFailed";

/// The derived secret could not be deleted.
pub const REASON_SECRET_DELETE_FAILED: &str = "SecretDeleteFailed";

/// A Kubernetes API call made by the controller itself (finalizer, status) failed.
pub const REASON_API_ERROR: &str = "ApiError";
