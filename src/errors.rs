// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation error types.
//!
//! Every failure carries an [`ErrorKind`]: **Permanent** when nothing short of an edit
//! to the resource (or its referenced Secret) will fix it, **Retryable** when the
//! operation should simply be attempted again after a delay. The kind is decided where
//! the failure happens and travels unchanged to the controller's error policy; no layer
//! in between widens a retryable failure into a permanent one.
//!
//! Each error also maps to a CamelCase reason from [`crate::status_reasons`], used for
//! the `Ready` condition, the Kubernetes Event and the error metric.

use crate::constants::DEFAULT_RETRY_DELAY_SECS;
use crate::secret_store::StoreError;
use crate::status_reasons::{
    REASON_API_ERROR, REASON_INVALID_SPEC, REASON_SECRET_DELETE_FAILED, REASON_SECRET_ERROR,
    REASON_SECRET_WRITE_FAILED, REASON_TOKEN_ERROR,
};
use crate::token::TokenError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Whether a failure is worth retrying, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Retrying without operator intervention will not help
    Permanent,
    /// Re-attempt after `delay`
    Retryable {
        /// Delay hint for the next attempt
        delay: Duration,
    },
}

impl ErrorKind {
    /// Metric label for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Permanent => "permanent",
            Self::Retryable { .. } => "retryable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can end a reconciliation of a `ServicePrincipalBinding`.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Required spec fields are absent or empty
    #[error("missing required fields: {}", missing.join(", "))]
    MissingSpecFields {
        /// Manifest names of the missing fields, in declaration order
        missing: Vec<&'static str>,
    },

    /// `clientSecretRef` lacks its name or key
    #[error("clientSecretRef in namespace {namespace} is missing its {field}")]
    InvalidSecretRef {
        /// Namespace of the owning resource
        namespace: String,
        /// `name` or `key`
        field: &'static str,
    },

    /// The referenced client secret does not exist (yet)
    #[error("Failed to get secret {namespace}/{name}: secret not found")]
    CredentialNotFound {
        namespace: String,
        name: String,
        retry_after: Duration,
    },

    /// The referenced client secret could not be read
    #[error("Failed to get secret {namespace}/{name}: {source}")]
    CredentialLookup {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
        retry_after: Duration,
    },

    /// The referenced key holds bytes that are not UTF-8
    #[error("secret {namespace}/{name} key {key} is not valid UTF-8")]
    CredentialEncoding {
        namespace: String,
        name: String,
        key: String,
    },

    /// The referenced key is missing or holds an empty value
    #[error("secret {namespace}/{name} has no value for key {key}")]
    EmptyCredential {
        namespace: String,
        name: String,
        key: String,
    },

    /// The token exchange failed
    #[error("token exchange failed: {0}")]
    TokenExchange(#[from] TokenError),

    /// The derived secret could not be created or replaced
    #[error("Failed to write secret {namespace}/{name}: {source}")]
    SecretWrite {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
        retry_after: Duration,
    },

    /// The derived secret could not be deleted
    #[error("Failed to delete secret {namespace}/{name}: {source}")]
    SecretDelete {
        namespace: String,
        name: String,
        #[source]
        source: StoreError,
        retry_after: Duration,
    },

    /// A Kubernetes API call on the resource itself failed (finalizer, status)
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl ReconcileError {
    /// Classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingSpecFields { .. }
            | Self::InvalidSecretRef { .. }
            | Self::CredentialEncoding { .. }
            | Self::EmptyCredential { .. }
            | Self::TokenExchange(_) => ErrorKind::Permanent,

            Self::CredentialNotFound { retry_after, .. }
            | Self::CredentialLookup { retry_after, .. }
            | Self::SecretWrite { retry_after, .. }
            | Self::SecretDelete { retry_after, .. } => ErrorKind::Retryable {
                delay: *retry_after,
            },

            Self::Kube(_) => ErrorKind::Retryable {
                delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            },
        }
    }

    /// Returns true if the failed operation should be re-attempted.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Retryable { .. })
    }

    /// Delay hint for retryable errors, `None` for permanent ones.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self.kind() {
            ErrorKind::Retryable { delay } => Some(delay),
            ErrorKind::Permanent => None,
        }
    }

    /// Status/Event reason for this error.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingSpecFields { .. } => REASON_INVALID_SPEC,
            Self::InvalidSecretRef { .. }
            | Self::CredentialNotFound { .. }
            | Self::CredentialLookup { .. }
            | Self::CredentialEncoding { .. } => REASON_SECRET_ERROR,
            Self::EmptyCredential { .. } | Self::TokenExchange(_) => REASON_TOKEN_ERROR,
            Self::SecretWrite { .. } => REASON_SECRET_WRITE_FAILED,
            Self::SecretDelete { .. } => REASON_SECRET_DELETE_FAILED,
            Self::Kube(_) => REASON_API_ERROR,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
