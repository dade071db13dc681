// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Client secret resolution.
//!
//! Reads the value named by a [`ClientSecretRef`] from a Secret in the resource's own
//! namespace. A malformed reference fails before the store is contacted; a missing or
//! unreachable Secret is retryable; a present Secret with no usable value is not.

use crate::crd::ClientSecretRef;
use crate::errors::ReconcileError;
use crate::secret_store::SecretStore;
use std::time::Duration;
use tracing::debug;

/// Resolve the client secret referenced by `secret_ref` in `namespace`.
///
/// Values are read from `data` first and `stringData` second.
///
/// # Errors
///
/// - [`ReconcileError::InvalidSecretRef`] if the reference lacks a name or key (permanent)
/// - [`ReconcileError::CredentialNotFound`] if the Secret does not exist (retryable)
/// - [`ReconcileError::CredentialLookup`] if the store fails (retryable)
/// - [`ReconcileError::EmptyCredential`] if the key is absent or empty (permanent)
/// - [`ReconcileError::CredentialEncoding`] if the value is not UTF-8 (permanent)
pub async fn resolve_client_secret(
    store: &dyn SecretStore,
    secret_ref: &ClientSecretRef,
    namespace: &str,
    retry_delay: Duration,
) -> Result<String, ReconcileError> {
    let name = required(secret_ref.name.as_deref(), namespace, "name")?;
    let key = required(secret_ref.key.as_deref(), namespace, "key")?;

    debug!(namespace = %namespace, name = %name, key = %key, "Resolving client secret");

    let secret = match store.get(namespace, name).await {
        Ok(Some(secret)) => secret,
        Ok(None) => {
            return Err(ReconcileError::CredentialNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
                retry_after: retry_delay,
            })
        }
        Err(source) => {
            return Err(ReconcileError::CredentialLookup {
                namespace: namespace.to_string(),
                name: name.to_string(),
                source,
                retry_after: retry_delay,
            })
        }
    };

    let value = if let Some(bytes) = secret.data.as_ref().and_then(|d| d.get(key)) {
        String::from_utf8(bytes.0.clone()).map_err(|_| ReconcileError::CredentialEncoding {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        })?
    } else {
        secret
            .string_data
            .as_ref()
            .and_then(|d| d.get(key))
            .cloned()
            .unwrap_or_default()
    };

    if value.is_empty() {
        return Err(ReconcileError::EmptyCredential {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        });
    }

    Ok(value)
}

fn required<'a>(
    value: Option<&'a str>,
    namespace: &str,
    field: &'static str,
) -> Result<&'a str, ReconcileError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ReconcileError::InvalidSecretRef {
            namespace: namespace.to_string(),
            field,
        }),
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod credentials_tests;
