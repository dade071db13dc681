// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller configuration.
//!
//! Every fixed value the controller depends on (deploy namespace, token scope,
//! timer interval, retry delay, request timeout) lives in [`ControllerConfig`] and is
//! handed to the [`Reconciler`](crate::reconcilers::Reconciler) at construction. The
//! defaults are the values in [`crate::constants`]; each one can be overridden with a
//! command-line flag or an `ARGOCD_SP_*` environment variable.
//!
//! # Example
//!
//! ```rust
//! use argocd_sp_operator::config::{Cli, ControllerConfig};
//! use clap::Parser;
//!
//! let cli = Cli::parse_from(["argocd-sp-operator", "--deploy-namespace", "gitops"]);
//! let config = cli.controller_config().unwrap();
//! assert_eq!(config.deploy_namespace, "gitops");
//! assert_eq!(config.refresh_interval, ControllerConfig::default().refresh_interval);
//! ```

use crate::constants::{
    DEFAULT_AUTHORITY_HOST, DEFAULT_DEPLOY_NAMESPACE, DEFAULT_IDLE_SECS,
    DEFAULT_INITIAL_DELAY_SECS, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_RETRY_DELAY_SECS,
    DEFAULT_TOKEN_EXPIRY_SKEW_SECS, DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS, DEFAULT_TOKEN_SCOPE,
    METRICS_SERVER_PORT,
};
use clap::Parser;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors raised while building a [`ControllerConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The deploy namespace is empty
    #[error("deploy namespace must not be empty")]
    EmptyDeployNamespace,

    /// The token scope is empty
    #[error("token scope must not be empty")]
    EmptyTokenScope,

    /// The authority host is not an absolute http(s) URL
    #[error("invalid authority host '{host}': {reason}")]
    InvalidAuthorityHost {
        /// The rejected value
        host: String,
        /// Why it was rejected
        reason: String,
    },

    /// A duration that must be positive is zero
    #[error("{name} must be greater than zero")]
    ZeroDuration {
        /// Flag name of the offending setting
        name: &'static str,
    },
}

/// Command-line and environment configuration for the controller binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "argocd-sp-operator",
    version,
    about = "Keeps ArgoCD repository secrets filled with fresh service principal access tokens"
)]
pub struct Cli {
    /// Namespace where derived secrets are written
    #[arg(long, env = "ARGOCD_SP_DEPLOY_NAMESPACE", default_value = DEFAULT_DEPLOY_NAMESPACE)]
    pub deploy_namespace: String,

    /// Identity provider authority, without tenant
    #[arg(long, env = "ARGOCD_SP_AUTHORITY_HOST", default_value = DEFAULT_AUTHORITY_HOST)]
    pub authority_host: String,

    /// OAuth2 scope requested in the client credentials exchange
    #[arg(long, env = "ARGOCD_SP_TOKEN_SCOPE", default_value = DEFAULT_TOKEN_SCOPE)]
    pub token_scope: String,

    /// Seconds between token refreshes
    #[arg(long, env = "ARGOCD_SP_REFRESH_INTERVAL_SECS", default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
    pub refresh_interval_secs: u64,

    /// Seconds before a retryable failure is re-attempted
    #[arg(long, env = "ARGOCD_SP_RETRY_DELAY_SECS", default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay_secs: u64,

    /// Timeout in seconds for a single token request
    #[arg(long, env = "ARGOCD_SP_TOKEN_TIMEOUT_SECS", default_value_t = DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS)]
    pub token_request_timeout_secs: u64,

    /// Shortest delay before a timer-driven refresh
    #[arg(long, env = "ARGOCD_SP_INITIAL_DELAY_SECS", default_value_t = DEFAULT_INITIAL_DELAY_SECS)]
    pub initial_delay_secs: u64,

    /// Window in which resource events are coalesced
    #[arg(long, env = "ARGOCD_SP_IDLE_SECS", default_value_t = DEFAULT_IDLE_SECS)]
    pub idle_secs: u64,

    /// Margin subtracted from the provider-reported token lifetime
    #[arg(long, env = "ARGOCD_SP_TOKEN_EXPIRY_SKEW_SECS", default_value_t = DEFAULT_TOKEN_EXPIRY_SKEW_SECS)]
    pub token_expiry_skew_secs: u64,

    /// Port for the metrics and health endpoints
    #[arg(long, env = "ARGOCD_SP_METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,
}

impl Cli {
    /// Build and validate the reconciler configuration from the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any value fails [`ControllerConfig::validate`].
    pub fn controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        let config = ControllerConfig {
            deploy_namespace: self.deploy_namespace.clone(),
            authority_host: self.authority_host.clone(),
            token_scope: self.token_scope.clone(),
            refresh_interval: Duration::from_secs(self.refresh_interval_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            token_request_timeout: Duration::from_secs(self.token_request_timeout_secs),
            initial_delay: Duration::from_secs(self.initial_delay_secs),
            idle: Duration::from_secs(self.idle_secs),
            token_expiry_skew: Duration::from_secs(self.token_expiry_skew_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Values the reconciler treats as fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace every derived secret is written to
    pub deploy_namespace: String,
    /// Identity provider authority (`https://login.microsoftonline.com`)
    pub authority_host: String,
    /// Scope requested in the client credentials exchange
    pub token_scope: String,
    /// Time between timer-driven refreshes
    pub refresh_interval: Duration,
    /// Delay hint carried by retryable failures
    pub retry_delay: Duration,
    /// Timeout for a single token request
    pub token_request_timeout: Duration,
    /// Shortest delay ever scheduled before a timer-driven refresh
    pub initial_delay: Duration,
    /// Event debounce window of the controller
    pub idle: Duration,
    /// Margin subtracted from a provider-reported token lifetime
    pub token_expiry_skew: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            deploy_namespace: DEFAULT_DEPLOY_NAMESPACE.to_string(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            token_scope: DEFAULT_TOKEN_SCOPE.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            token_request_timeout: Duration::from_secs(DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS),
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_DELAY_SECS),
            idle: Duration::from_secs(DEFAULT_IDLE_SECS),
            token_expiry_skew: Duration::from_secs(DEFAULT_TOKEN_EXPIRY_SKEW_SECS),
        }
    }
}

impl ControllerConfig {
    /// Check the configuration for values the reconciler cannot work with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: an empty namespace or scope, a non-http(s)
    /// authority, or a zero refresh interval, retry delay or request timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deploy_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyDeployNamespace);
        }
        if self.token_scope.trim().is_empty() {
            return Err(ConfigError::EmptyTokenScope);
        }
        let authority =
            Url::parse(&self.authority_host).map_err(|e| ConfigError::InvalidAuthorityHost {
                host: self.authority_host.clone(),
                reason: e.to_string(),
            })?;
        if !matches!(authority.scheme(), "http" | "https") || authority.cannot_be_a_base() {
            return Err(ConfigError::InvalidAuthorityHost {
                host: self.authority_host.clone(),
                reason: "expected an absolute http(s) URL".to_string(),
            });
        }
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "refresh-interval-secs",
            });
        }
        if self.retry_delay.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "retry-delay-secs",
            });
        }
        if self.token_request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "token-timeout-secs",
            });
        }
        Ok(())
    }

    /// Token endpoint for a tenant: `{authority}/{tenant}/oauth2/v2.0/token`.
    #[must_use]
    pub fn token_endpoint(&self, tenant_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.authority_host.trim_end_matches('/'),
            tenant_id,
            crate::constants::TOKEN_ENDPOINT_PATH
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
