// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory fakes for reconciler tests.

use crate::crd::{ClientSecretRef, ServicePrincipalBinding, ServicePrincipalBindingSpec};
use crate::events::EventPublisher;
use crate::secret_store::{DeleteOutcome, SecretStore, StoreError};
use crate::token::{AccessToken, TokenError, TokenExchanger};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ObjectReference, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::runtime::events::EventType;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Secret store backed by a map, with switchable failures.
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: Mutex<BTreeMap<(String, String), Secret>>,
    pub fail_get: AtomicBool,
    pub fail_write: AtomicBool,
    pub fail_delete: AtomicBool,
    pub gets: AtomicUsize,
    pub creates: AtomicUsize,
    pub replaces: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a secret whose `data[key]` is `value`.
    pub fn insert_data(&self, namespace: &str, name: &str, key: &str, value: &[u8]) {
        let mut data = BTreeMap::new();
        data.insert(key.to_string(), ByteString(value.to_vec()));
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        };
        self.insert(namespace, secret);
    }

    pub fn insert(&self, namespace: &str, secret: Secret) {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.secrets
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name), secret);
    }

    pub fn get_secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// `stringData[key]` of a stored secret.
    pub fn string_value(&self, namespace: &str, name: &str, key: &str) -> Option<String> {
        self.get_secret(namespace, name)?
            .string_data?
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.secrets.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn api_error(code: u16, reason: &str, message: &str) -> StoreError {
        StoreError::Kube(kube::Error::Api(Box::new(kube::core::Status {
            status: Some(kube::core::response::StatusSummary::Failure),
            message: message.to_string(),
            reason: reason.to_string(),
            code,
            metadata: None,
            details: None,
        })))
    }

    fn unavailable() -> StoreError {
        Self::api_error(500, "InternalError", "injected failure")
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.get_secret(namespace, name))
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<(), StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let name = secret.metadata.name.clone().unwrap_or_default();
        let mut secrets = self.secrets.lock().unwrap();
        let key = (namespace.to_string(), name);
        if secrets.contains_key(&key) {
            return Err(Self::api_error(409, "AlreadyExists", "secret already exists"));
        }
        secrets.insert(key, secret.clone());
        Ok(())
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        secret: &Secret,
    ) -> Result<(), StoreError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        if self.fail_write.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.secrets
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), secret.clone());
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str) -> Result<DeleteOutcome, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        let removed = self
            .secrets
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()));
        Ok(if removed.is_some() {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }
}

/// Scripted reply of [`FakeTokenExchanger`].
#[derive(Debug, Clone)]
pub enum TokenReply {
    Token {
        value: String,
        expires_in: Option<u64>,
    },
    Status(u16),
    NoToken,
}

/// Arguments of one exchange call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeCall {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Token exchanger returning queued replies, then repeating the default.
pub struct FakeTokenExchanger {
    replies: Mutex<VecDeque<TokenReply>>,
    default: TokenReply,
    calls: Mutex<Vec<ExchangeCall>>,
}

impl FakeTokenExchanger {
    pub fn returning(token: &str) -> Self {
        Self::with_default(TokenReply::Token {
            value: token.to_string(),
            expires_in: None,
        })
    }

    pub fn with_default(default: TokenReply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: TokenReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenExchanger for FakeTokenExchanger {
    async fn exchange(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, TokenError> {
        self.calls.lock().unwrap().push(ExchangeCall {
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        match reply {
            TokenReply::Token { value, expires_in } => Ok(AccessToken {
                value,
                expires_in: expires_in.map(Duration::from_secs),
            }),
            TokenReply::Status(status) => Err(TokenError::Status {
                status,
                body: r#"{"error":"invalid_client"}"#.to_string(),
            }),
            TokenReply::NoToken => Err(TokenError::MissingAccessToken {
                body: r#"{"token_type":"Bearer"}"#.to_string(),
            }),
        }
    }
}

/// One published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub object: Option<String>,
    pub warning: bool,
    pub reason: String,
    pub action: String,
    pub note: Option<String>,
}

/// Event publisher that keeps everything it is given.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<RecordedEvent> {
        self.events().into_iter().filter(|e| e.warning).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            object: resource_ref.name.clone(),
            warning: matches!(type_, EventType::Warning),
            reason: reason.to_string(),
            action: action.to_string(),
            note,
        });
    }
}

/// A complete binding `name` in `namespace` referencing `sp-credentials/clientSecret`.
pub fn binding(name: &str, namespace: &str) -> ServicePrincipalBinding {
    let mut sp = ServicePrincipalBinding::new(
        name,
        ServicePrincipalBindingSpec {
            client_id: Some("00000000-0000-0000-0000-000000000001".to_string()),
            client_secret_ref: Some(ClientSecretRef {
                name: Some("sp-credentials".to_string()),
                key: Some("clientSecret".to_string()),
            }),
            tenant_id: Some("contoso.onmicrosoft.com".to_string()),
            git_url: Some("https://dev.azure.com/contoso/project/_git/repo".to_string()),
            secret_type: Some("repository".to_string()),
        },
    );
    sp.metadata.namespace = Some(namespace.to_string());
    sp.metadata.generation = Some(1);
    sp.metadata.uid = Some(format!("uid-{namespace}-{name}"));
    sp
}
