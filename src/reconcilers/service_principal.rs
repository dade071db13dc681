// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `ServicePrincipalBinding` reconciler.
//!
//! A sync validates the spec, resolves the client secret, exchanges it for an access
//! token and upserts the derived secret. Creation, spec edits, controller restarts and
//! the refresh timer all run the same sync; [`Trigger::Idle`] wake-ups do nothing but
//! reschedule. Deletion removes the derived secret.
//!
//! Failures keep the classification given where they happened. Each one is reported
//! exactly once, here, as a Warning event, an error metric and the `Ready` condition.

use crate::config::ControllerConfig;
use crate::crd::{ServicePrincipalBinding, ServicePrincipalBindingStatus};
use crate::errors::ReconcileError;
use crate::events::{EventPublisher, ACTION_DELETE, ACTION_RECONCILE};
use crate::metrics;
use crate::reconcilers::credentials::resolve_client_secret;
use crate::reconcilers::derived_secret::{
    build_derived_secret, derived_secret_name, remove, upsert, DerivedSecretSpec, UpsertOutcome,
};
use crate::reconcilers::locks::{resource_key, ResourceLocks};
use crate::reconcilers::status::{failed_status, synced_status, SyncReport};
use crate::reconcilers::trigger::{
    classify, delay_after_failure, delay_after_success, rfc3339_after, Trigger,
};
use crate::secret_store::{DeleteOutcome, SecretStore};
use crate::status_reasons::{
    REASON_DELETED_SECRET, REASON_SECRET_DELETE_FAILED, REASON_SECRET_NOT_FOUND,
    REASON_SECRET_SYNCED,
};
use crate::token::TokenExchanger;
use chrono::Utc;
use kube::runtime::events::EventType;
use kube::{Resource, ResourceExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Derived secret written by a successful sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedSecret {
    pub name: String,
    pub namespace: String,
    pub outcome: UpsertOutcome,
    /// Token lifetime reported by the identity provider
    pub expires_in: Option<Duration>,
}

/// Result of one reconciliation.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing was due
    Skipped,
    /// The derived secret now holds a fresh token
    Synced(SyncedSecret),
    /// The sync failed
    Failed(ReconcileError),
}

/// What the controller should do after [`Reconciler::reconcile`].
#[derive(Debug)]
pub struct Reconciliation {
    pub trigger: Trigger,
    pub outcome: Outcome,
    /// New status to write, `None` when nothing changed
    pub status: Option<ServicePrincipalBindingStatus>,
    /// When to reconcile again
    pub requeue_after: Duration,
}

/// Reconciles `ServicePrincipalBinding` resources against the secret store and the
/// identity provider.
pub struct Reconciler {
    config: ControllerConfig,
    secrets: Arc<dyn SecretStore>,
    tokens: Arc<dyn TokenExchanger>,
    events: Arc<dyn EventPublisher>,
    locks: ResourceLocks,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        config: ControllerConfig,
        secrets: Arc<dyn SecretStore>,
        tokens: Arc<dyn TokenExchanger>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            config,
            secrets,
            tokens,
            events,
            locks: ResourceLocks::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Drop per-resource state for bindings that no longer exist.
    ///
    /// `live` holds the `namespace/name` keys of every binding still in the cache.
    pub fn retain_resources(&self, live: &HashSet<String>) {
        self.locks.retain(|key| live.contains(key));
    }

    /// Bring the derived secret of `sp` up to date if anything is due.
    ///
    /// Never returns an error directly: failures are reported (event, metric, status)
    /// and handed back in [`Outcome::Failed`] for the controller's error policy.
    pub async fn reconcile(&self, sp: &ServicePrincipalBinding) -> Reconciliation {
        let namespace = sp.namespace().unwrap_or_default();
        let name = sp.name_any();
        let key = resource_key(&namespace, &name);
        let _guard = self.locks.lock(&key).await;

        let start = Instant::now();
        let trigger = classify(sp, self.locks.first_sighting(&key), Utc::now());

        if let Trigger::Idle { wait } = trigger {
            debug!(
                namespace = %namespace,
                name = %name,
                wait_secs = wait.as_secs(),
                "Token refresh not due yet"
            );
            metrics::record_reconciliation(trigger.as_str(), "skipped", start.elapsed());
            return Reconciliation {
                trigger,
                outcome: Outcome::Skipped,
                status: None,
                requeue_after: wait,
            };
        }

        info!(
            namespace = %namespace,
            name = %name,
            trigger = trigger.as_str(),
            "Reconciling ServicePrincipalBinding"
        );

        let result = self.sync(sp, &namespace, &name).await;
        let now = Utc::now();

        match result {
            Ok(synced) => {
                let delay = delay_after_success(&self.config, synced.expires_in);
                let message = format!(
                    "Secret {}/{} {}",
                    synced.namespace,
                    synced.name,
                    synced.outcome.as_str()
                );
                let status = synced_status(
                    sp,
                    &SyncReport {
                        reason: REASON_SECRET_SYNCED,
                        message: &message,
                        secret_name: &synced.name,
                        secret_namespace: &synced.namespace,
                        next_refresh_time: rfc3339_after(now, delay),
                        token_expires_at: synced.expires_in.map(|e| rfc3339_after(now, e)),
                    },
                    now,
                );

                info!(
                    namespace = %namespace,
                    name = %name,
                    secret = %synced.name,
                    next_refresh_secs = delay.as_secs(),
                    "ServicePrincipalBinding reconciled"
                );
                self.publish(sp, EventType::Normal, REASON_SECRET_SYNCED, ACTION_RECONCILE, message)
                    .await;
                metrics::record_secret_operation(synced.outcome.as_str());
                metrics::record_reconciliation(trigger.as_str(), "success", start.elapsed());

                Reconciliation {
                    trigger,
                    outcome: Outcome::Synced(synced),
                    status: Some(status),
                    requeue_after: delay,
                }
            }
            Err(err) => {
                let kind = err.kind();
                let delay = delay_after_failure(&self.config, kind);
                let message = err.to_string();
                let status = failed_status(sp, err.reason(), &message, rfc3339_after(now, delay));

                error!(
                    namespace = %namespace,
                    name = %name,
                    reason = err.reason(),
                    kind = %kind,
                    retry_secs = delay.as_secs(),
                    error = %message,
                    "Failed to reconcile ServicePrincipalBinding"
                );
                self.publish(sp, EventType::Warning, err.reason(), ACTION_RECONCILE, message)
                    .await;
                metrics::record_error(err.reason(), kind.as_str());
                metrics::record_reconciliation(trigger.as_str(), "error", start.elapsed());

                Reconciliation {
                    trigger,
                    outcome: Outcome::Failed(err),
                    status: Some(status),
                    requeue_after: delay,
                }
            }
        }
    }

    /// Validate, resolve, exchange, upsert. No reporting happens here.
    async fn sync(
        &self,
        sp: &ServicePrincipalBinding,
        namespace: &str,
        name: &str,
    ) -> Result<SyncedSecret, ReconcileError> {
        let spec = &sp.spec;
        let missing = spec.missing_fields();
        let (
            Some(client_id),
            Some(secret_ref),
            Some(tenant_id),
            Some(git_url),
            Some(secret_type),
        ) = (
            spec.client_id.as_deref(),
            spec.client_secret_ref.as_ref(),
            spec.tenant_id.as_deref(),
            spec.git_url.as_deref(),
            spec.secret_type.as_deref(),
        )
        else {
            return Err(ReconcileError::MissingSpecFields { missing });
        };
        if !missing.is_empty() {
            return Err(ReconcileError::MissingSpecFields { missing });
        }

        let client_secret = resolve_client_secret(
            self.secrets.as_ref(),
            secret_ref,
            namespace,
            self.config.retry_delay,
        )
        .await?;

        let started = Instant::now();
        let token = self
            .tokens
            .exchange(tenant_id.trim(), client_id.trim(), &client_secret)
            .await;
        metrics::record_token_exchange(token.is_ok(), started.elapsed());
        let token = token?;

        let deploy_namespace = self.config.deploy_namespace.as_str();
        let secret = build_derived_secret(
            &DerivedSecretSpec {
                owner_name: name,
                owner_namespace: namespace,
                deploy_namespace,
                git_url,
                secret_type,
            },
            &token.value,
        );
        let outcome = upsert(
            self.secrets.as_ref(),
            deploy_namespace,
            &secret,
            self.config.retry_delay,
        )
        .await?;

        Ok(SyncedSecret {
            name: derived_secret_name(name, namespace, deploy_namespace),
            namespace: deploy_namespace.to_string(),
            outcome,
            expires_in: token.expires_in,
        })
    }

    /// Delete the derived secret of `sp`.
    ///
    /// An already missing secret counts as success and is reported informationally.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::SecretDelete`] (retryable) if the delete fails.
    pub async fn cleanup(&self, sp: &ServicePrincipalBinding) -> Result<DeleteOutcome, ReconcileError> {
        let namespace = sp.namespace().unwrap_or_default();
        let name = sp.name_any();
        let key = resource_key(&namespace, &name);
        let guard = self.locks.lock(&key).await;

        let start = Instant::now();
        let deploy_namespace = self.config.deploy_namespace.as_str();
        let secret_name = derived_secret_name(&name, &namespace, deploy_namespace);

        match remove(
            self.secrets.as_ref(),
            deploy_namespace,
            &secret_name,
            self.config.retry_delay,
        )
        .await
        {
            Ok(outcome) => {
                let (reason, message, op) = match outcome {
                    DeleteOutcome::Deleted => (
                        REASON_DELETED_SECRET,
                        format!("Secret {secret_name} deleted successfully."),
                        "deleted",
                    ),
                    DeleteOutcome::NotFound => (
                        REASON_SECRET_NOT_FOUND,
                        format!("Secret {secret_name} not found."),
                        "not_found",
                    ),
                };
                info!(namespace = %namespace, name = %name, secret = %secret_name, "{message}");
                self.publish(sp, EventType::Normal, reason, ACTION_DELETE, message)
                    .await;
                metrics::record_secret_operation(op);
                metrics::record_reconciliation("delete", "success", start.elapsed());
                drop(guard);
                self.locks.forget(&key);
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    namespace = %namespace,
                    name = %name,
                    secret = %secret_name,
                    error = %err,
                    "Failed to delete derived secret"
                );
                self.publish(
                    sp,
                    EventType::Warning,
                    REASON_SECRET_DELETE_FAILED,
                    ACTION_DELETE,
                    err.to_string(),
                )
                .await;
                metrics::record_error(err.reason(), err.kind().as_str());
                metrics::record_reconciliation("delete", "error", start.elapsed());
                Err(err)
            }
        }
    }

    async fn publish(
        &self,
        sp: &ServicePrincipalBinding,
        type_: EventType,
        reason: &str,
        action: &str,
        note: String,
    ) {
        self.events
            .publish(&sp.object_ref(&()), type_, reason, action, Some(note))
            .await;
    }
}

#[cfg(test)]
#[path = "service_principal_tests.rs"]
mod service_principal_tests;
