// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Access to Kubernetes Secrets.
//!
//! The reconciler reads client secrets from the owning resource's namespace and writes
//! derived secrets to the deploy namespace. Both go through [`SecretStore`], which
//! reports "not found" as a value (`None` / [`DeleteOutcome::NotFound`]) rather than an
//! error, because absence means something different at every call site.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
use thiserror::Error;
use tracing::debug;

/// Failure talking to the secret store. Not-found is never reported through this type.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The Kubernetes API rejected or failed the request
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The secret existed and was deleted
    Deleted,
    /// There was nothing to delete
    NotFound,
}

/// Read/create/replace/delete of Secrets by namespace and name.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret, `None` if it does not exist.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError>;

    /// Create a secret. Its name is taken from `secret.metadata.name`.
    async fn create(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Replace an existing secret wholesale.
    async fn replace(&self, namespace: &str, name: &str, secret: &Secret)
        -> Result<(), StoreError>;

    /// Delete a secret.
    async fn delete(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, StoreError>;
}

/// [`SecretStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// `true` for an API error response carrying HTTP 404.
#[must_use]
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == 404)
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        debug!(namespace = %namespace, name = %name, "Reading secret");
        match self.api(namespace).get(name).await {
            Ok(secret) => Ok(Some(secret)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError> {
        debug!(
            namespace = %namespace,
            name = ?secret.metadata.name,
            "Creating secret"
        );
        self.api(namespace)
            .create(&PostParams::default(), secret)
            .await?;
        Ok(())
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        secret: &Secret,
    ) -> Result<(), StoreError> {
        debug!(namespace = %namespace, name = %name, "Replacing secret");
        self.api(namespace)
            .replace(name, &PostParams::default(), secret)
            .await?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, StoreError> {
        debug!(namespace = %namespace, name = %name, "Deleting secret");
        match self.api(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(e) if is_not_found(&e) => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}
