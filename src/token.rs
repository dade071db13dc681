// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! OAuth2 client credentials exchange.
//!
//! [`ClientCredentialsExchanger`] posts a form-encoded client credentials grant to
//! `{authority}/{tenant}/oauth2/v2.0/token` and returns the `access_token` from the
//! JSON response. Every failure (transport, timeout, non-2xx status, malformed body)
//! is reported as a [`TokenError`]; the caller decides how to classify it.
//!
//! The response body is logged at debug level with the token redacted.

use crate::config::ControllerConfig;
use crate::constants::GRANT_TYPE_CLIENT_CREDENTIALS;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Placeholder written in place of secrets in logs.
const REDACTED: &str = "[REDACTED]";

/// Errors returned by the token endpoint exchange.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Tenant id cannot be placed in the endpoint path
    #[error("invalid tenant id '{tenant}'")]
    InvalidTenant {
        /// The rejected tenant id
        tenant: String,
    },

    /// The request could not be sent or timed out
    #[error("request to {url} failed: {source}")]
    Request {
        /// Token endpoint
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The identity provider answered with a non-2xx status
    #[error("token endpoint returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body with token fields redacted
        body: String,
    },

    /// The response body is not a JSON object
    #[error("token endpoint returned an unreadable body: {reason}")]
    Decode {
        /// Parse failure
        reason: String,
    },

    /// The response is JSON but carries no usable `access_token`
    #[error("token endpoint response has no access_token: {body}")]
    MissingAccessToken {
        /// Response body with token fields redacted
        body: String,
    },
}

/// Bearer token returned by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The token itself
    pub value: String,
    /// Lifetime reported by the provider, if any
    pub expires_in: Option<Duration>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &REDACTED)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Exchanges service principal credentials for an access token.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Perform one client credentials exchange.
    async fn exchange(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, TokenError>;
}

/// [`TokenExchanger`] speaking the OAuth2 client credentials grant over HTTPS.
#[derive(Clone)]
pub struct ClientCredentialsExchanger {
    http: HttpClient,
    config: ControllerConfig,
}

impl ClientCredentialsExchanger {
    /// Build an exchanger whose requests time out after `config.token_request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (TLS backend initialization).
    pub fn new(config: &ControllerConfig) -> Result<Self, reqwest::Error> {
        let http = HttpClient::builder()
            .timeout(config.token_request_timeout)
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl TokenExchanger for ClientCredentialsExchanger {
    async fn exchange(
        &self,
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<AccessToken, TokenError> {
        validate_tenant(tenant_id)?;
        let url = self.config.token_endpoint(tenant_id);
        let body = encode_form(client_id, client_secret, &self.config.token_scope);

        info!(
            url = %url,
            client_id = %client_id,
            scope = %self.config.token_scope,
            "Requesting access token"
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| TokenError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| TokenError::Request {
                url: url.clone(),
                source,
            })?;

        debug!(
            url = %url,
            status = %status,
            body = %redact_body(&text),
            "Token endpoint response"
        );

        if !status.is_success() {
            error!(
                url = %url,
                status = %status,
                "Token request rejected"
            );
            return Err(TokenError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let token = parse_token_response(&text)?;
        info!(
            url = %url,
            expires_in = ?token.expires_in,
            "Access token obtained"
        );
        Ok(token)
    }
}

/// Reject tenant ids that would change the shape of the endpoint URL.
///
/// # Errors
///
/// Returns [`TokenError::InvalidTenant`] for an empty id or one containing a path,
/// query or fragment delimiter or whitespace.
pub fn validate_tenant(tenant_id: &str) -> Result<(), TokenError> {
    let bad = tenant_id.is_empty()
        || tenant_id == "."
        || tenant_id == ".."
        || tenant_id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#') || c.is_whitespace());
    if bad {
        return Err(TokenError::InvalidTenant {
            tenant: tenant_id.to_string(),
        });
    }
    Ok(())
}

/// `application/x-www-form-urlencoded` body of a client credentials grant.
#[must_use]
pub fn encode_form(client_id: &str, client_secret: &str, scope: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS)
        .append_pair("client_id", client_id)
        .append_pair("client_secret", client_secret)
        .append_pair("scope", scope)
        .finish()
}

/// Extract the access token and its lifetime from a token endpoint response body.
///
/// `expires_in` is accepted as a number or a numeric string; anything else is ignored.
///
/// # Errors
///
/// Returns [`TokenError::Decode`] if the body is not a JSON object and
/// [`TokenError::MissingAccessToken`] if `access_token` is absent, empty or not a string.
pub fn parse_token_response(body: &str) -> Result<AccessToken, TokenError> {
    let value: Value = serde_json::from_str(body).map_err(|e| TokenError::Decode {
        reason: e.to_string(),
    })?;
    let Value::Object(fields) = value else {
        return Err(TokenError::Decode {
            reason: "expected a JSON object".to_string(),
        });
    };

    let token = fields
        .get("access_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TokenError::MissingAccessToken {
            body: redact_body(body),
        })?;

    let expires_in = fields.get("expires_in").and_then(|v| match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    });

    Ok(AccessToken {
        value: token.to_string(),
        expires_in: expires_in.map(Duration::from_secs),
    })
}

/// Response body with `access_token` and `refresh_token` values replaced.
///
/// Bodies that are not JSON objects are returned unchanged; they cannot carry a token.
#[must_use]
pub fn redact_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut fields)) => {
            for key in ["access_token", "refresh_token", "id_token"] {
                if let Some(v) = fields.get_mut(key) {
                    *v = Value::String(REDACTED.to_string());
                }
            }
            Value::Object(fields).to_string()
        }
        _ => body.to_string(),
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod token_tests;
