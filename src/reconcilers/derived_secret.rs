// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The derived ArgoCD repository secret.
//!
//! Each `ServicePrincipalBinding` `name` in `namespace` owns exactly one Secret,
//! `{name}-{namespace}-{deployNamespace}-token`, in the deploy namespace. Its payload is
//! what ArgoCD expects of a repository credential:
//!
//! | key        | value                          |
//! |------------|--------------------------------|
//! | `password` | the access token               |
//! | `url`      | `spec.gitUrl`                  |
//! | `project`  | namespace of the owning binding |
//!
//! and it is labelled `argocd.argoproj.io/secret-type: <spec.secretType>`.
//!
//! Upserts always replace the whole object without a `resourceVersion`, so the last
//! writer wins.

use crate::constants::{
    DERIVED_SECRET_SUFFIX, DERIVED_SECRET_TYPE, SECRET_KEY_PASSWORD, SECRET_KEY_PROJECT,
    SECRET_KEY_URL,
};
use crate::errors::ReconcileError;
use crate::labels::{
    ARGOCD_SECRET_TYPE_LABEL, K8S_MANAGED_BY, K8S_PART_OF, MANAGED_BY_OPERATOR,
    OWNER_NAMESPACE_ANNOTATION, OWNER_NAME_ANNOTATION, PART_OF_ARGOCD,
};
use crate::secret_store::{DeleteOutcome, SecretStore};
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Replaced,
}

impl UpsertOutcome {
    /// Past-tense verb, also used as the metric label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Replaced => "replaced",
        }
    }
}

/// Name of the derived secret for binding `name` in `namespace`.
///
/// ```rust
/// use argocd_sp_operator::reconcilers::derived_secret::derived_secret_name;
/// assert_eq!(
///     derived_secret_name("demo", "team-a", "argocd"),
///     "demo-team-a-argocd-token"
/// );
/// ```
#[must_use]
pub fn derived_secret_name(name: &str, namespace: &str, deploy_namespace: &str) -> String {
    format!("{name}-{namespace}-{deploy_namespace}-{DERIVED_SECRET_SUFFIX}")
}

/// Inputs for [`build_derived_secret`].
#[derive(Debug, Clone, Copy)]
pub struct DerivedSecretSpec<'a> {
    /// Name of the owning binding
    pub owner_name: &'a str,
    /// Namespace of the owning binding, also the ArgoCD project
    pub owner_namespace: &'a str,
    /// Namespace the secret is written to
    pub deploy_namespace: &'a str,
    /// Repository URL
    pub git_url: &'a str,
    /// Value of the ArgoCD secret-type label
    pub secret_type: &'a str,
}

/// Build the derived secret carrying `token`.
#[must_use]
pub fn build_derived_secret(spec: &DerivedSecretSpec<'_>, token: &str) -> Secret {
    let name = derived_secret_name(spec.owner_name, spec.owner_namespace, spec.deploy_namespace);

    let mut labels = BTreeMap::new();
    labels.insert(
        ARGOCD_SECRET_TYPE_LABEL.to_string(),
        spec.secret_type.to_string(),
    );
    labels.insert(K8S_MANAGED_BY.to_string(), MANAGED_BY_OPERATOR.to_string());
    labels.insert(K8S_PART_OF.to_string(), PART_OF_ARGOCD.to_string());

    let mut annotations = BTreeMap::new();
    annotations.insert(
        OWNER_NAME_ANNOTATION.to_string(),
        spec.owner_name.to_string(),
    );
    annotations.insert(
        OWNER_NAMESPACE_ANNOTATION.to_string(),
        spec.owner_namespace.to_string(),
    );

    let mut string_data = BTreeMap::new();
    string_data.insert(SECRET_KEY_PASSWORD.to_string(), token.to_string());
    string_data.insert(SECRET_KEY_URL.to_string(), spec.git_url.to_string());
    string_data.insert(
        SECRET_KEY_PROJECT.to_string(),
        spec.owner_namespace.to_string(),
    );

    Secret {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(spec.deploy_namespace.to_string()),
            labels: Some(labels),
            annotations: Some(annotations),
            ..Default::default()
        },
        type_: Some(DERIVED_SECRET_TYPE.to_string()),
        string_data: Some(string_data),
        ..Default::default()
    }
}

/// Create `secret` in `namespace`, or replace it wholesale if it already exists.
///
/// # Errors
///
/// Returns [`ReconcileError::SecretWrite`] (retryable after `retry_delay`) if the
/// lookup, create or replace fails.
pub async fn upsert(
    store: &dyn SecretStore,
    namespace: &str,
    secret: &Secret,
    retry_delay: Duration,
) -> Result<UpsertOutcome, ReconcileError> {
    let name = secret.metadata.name.clone().unwrap_or_default();
    let write_error = |source| ReconcileError::SecretWrite {
        namespace: namespace.to_string(),
        name: name.clone(),
        source,
        retry_after: retry_delay,
    };

    let existing = store.get(namespace, &name).await.map_err(write_error)?;
    let outcome = if existing.is_some() {
        debug!(namespace = %namespace, name = %name, "Derived secret exists, replacing");
        store
            .replace(namespace, &name, secret)
            .await
            .map_err(write_error)?;
        UpsertOutcome::Replaced
    } else {
        debug!(namespace = %namespace, name = %name, "Derived secret absent, creating");
        store.create(namespace, secret).await.map_err(write_error)?;
        UpsertOutcome::Created
    };

    info!(
        namespace = %namespace,
        name = %name,
        outcome = outcome.as_str(),
        "Derived secret written"
    );
    Ok(outcome)
}

/// Delete the derived secret `name` from `namespace`.
///
/// An absent secret is reported as [`DeleteOutcome::NotFound`], not as an error.
///
/// # Errors
///
/// Returns [`ReconcileError::SecretDelete`] (retryable after `retry_delay`) for any
/// other failure.
pub async fn remove(
    store: &dyn SecretStore,
    namespace: &str,
    name: &str,
    retry_delay: Duration,
) -> Result<DeleteOutcome, ReconcileError> {
    store
        .delete(namespace, name)
        .await
        .map_err(|source| ReconcileError::SecretDelete {
            namespace: namespace.to_string(),
            name: name.to_string(),
            source,
            retry_after: retry_delay,
        })
}

#[cfg(test)]
#[path = "derived_secret_tests.rs"]
mod derived_secret_tests;
