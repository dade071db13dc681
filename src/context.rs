// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context handed to the `ServicePrincipalBinding` controller.

use crate::config::ControllerConfig;
use crate::events::KubeEventPublisher;
use crate::reconcilers::Reconciler;
use crate::secret_store::KubeSecretStore;
use crate::token::ClientCredentialsExchanger;
use kube::Client;
use std::sync::Arc;

/// Shared context passed to every reconciliation.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for finalizer and status patches
    pub client: Client,

    /// Reconciler holding the secret store, token exchanger and event publisher
    pub reconciler: Arc<Reconciler>,
}

impl Context {
    /// Wire the reconciler to the live cluster and identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for token requests cannot be built.
    pub fn new(client: Client, config: ControllerConfig) -> Result<Self, reqwest::Error> {
        let tokens = ClientCredentialsExchanger::new(&config)?;
        let reconciler = Reconciler::new(
            config,
            Arc::new(KubeSecretStore::new(client.clone())),
            Arc::new(tokens),
            Arc::new(KubeEventPublisher::new(client.clone())),
        );

        Ok(Self {
            client,
            reconciler: Arc::new(reconciler),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        self.reconciler.config()
    }
}
