// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for namespaced custom resources.
//!
//! The derived secret lives in a different namespace from its binding, so Kubernetes
//! garbage collection cannot remove it through an owner reference. A finalizer keeps
//! the binding around until its cleanup has run.
//!
//! # Example
//!
//! ```rust,ignore
//! use argocd_sp_operator::reconcilers::finalizers::{ensure_finalizer, handle_deletion};
//! use argocd_sp_operator::labels::FINALIZER_SERVICE_PRINCIPAL;
//!
//! if sp.metadata.deletion_timestamp.is_some() {
//!     return handle_deletion(&client, &sp, FINALIZER_SERVICE_PRINCIPAL, || async {
//!         reconciler.cleanup(&sp).await.map(|_| ())
//!     })
//!     .await;
//! }
//! ensure_finalizer(&client, &sp, FINALIZER_SERVICE_PRINCIPAL).await?;
//! ```

use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use std::future::Future;
use tracing::info;

/// `true` if `finalizer` is present on `resource`.
#[must_use]
pub fn has_finalizer<T: Resource>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == finalizer))
}

/// Add a finalizer to a resource if not already present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn ensure_finalizer<T>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<(), kube::Error>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if has_finalizer(resource, finalizer) {
        return Ok(());
    }

    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    info!(
        "Adding finalizer {} to {}/{} {}",
        finalizer,
        namespace,
        name,
        T::kind(&())
    );

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.push(finalizer.to_string());

    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Remove a finalizer from a resource.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn remove_finalizer<T>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<(), kube::Error>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if !has_finalizer(resource, finalizer) {
        return Ok(());
    }

    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    info!(
        "Removing finalizer {} from {}/{} {}",
        finalizer,
        namespace,
        name,
        T::kind(&())
    );

    let finalizers: Vec<String> = resource
        .meta()
        .finalizers
        .iter()
        .flatten()
        .filter(|f| *f != finalizer)
        .cloned()
        .collect();

    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// Run `cleanup` and then remove the finalizer.
///
/// Does nothing if the finalizer is already gone. If `cleanup` fails the finalizer
/// stays and deletion is blocked until a later attempt succeeds.
///
/// # Errors
///
/// Returns the cleanup error, or the finalizer patch error converted into `E`.
pub async fn handle_deletion<T, F, Fut, E>(
    client: &Client,
    resource: &T,
    finalizer: &str,
    cleanup: F,
) -> Result<(), E>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: From<kube::Error>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    info!("{} {}/{} is being deleted", T::kind(&()), namespace, name);

    if has_finalizer(resource, finalizer) {
        info!(
            "Running cleanup for {} {}/{}",
            T::kind(&()),
            namespace,
            name
        );
        cleanup().await?;
        remove_finalizer(client, resource, finalizer).await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
