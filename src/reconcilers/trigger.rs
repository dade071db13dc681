// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Why a reconciliation runs, and when the next one is due.
//!
//! The controller is woken for many reasons (spec edits, its own status patches,
//! requeues, restarts). [`classify`] turns the resource's generation and status into a
//! [`Trigger`]; only [`Trigger::Idle`] skips the token refresh. This keeps status
//! patches from causing refresh loops while the refresh timer survives restarts,
//! because the next due time is stored in `status.nextRefreshTime`.

use crate::config::ControllerConfig;
use crate::crd::ServicePrincipalBinding;
use crate::errors::ErrorKind;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Tolerance when comparing the wall clock against a stored due time.
pub const SCHEDULE_SLACK: Duration = Duration::from_secs(1);

/// Reason for a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Never reconciled before
    Created,
    /// The spec changed since the last reconciliation
    Updated,
    /// First sighting since this process started
    Resumed,
    /// The refresh timer is due
    Refresh,
    /// Nothing to do before `wait` elapses
    Idle {
        /// Time until the refresh timer is due
        wait: Duration,
    },
}

impl Trigger {
    /// Metric and log label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Resumed => "resumed",
            Self::Refresh => "refresh",
            Self::Idle { .. } => "idle",
        }
    }
}

/// Classify a reconciliation of `sp` at `now`.
///
/// `first_sighting` is true when this process has not reconciled the resource before.
#[must_use]
pub fn classify(sp: &ServicePrincipalBinding, first_sighting: bool, now: DateTime<Utc>) -> Trigger {
    let Some(status) = sp.status.as_ref() else {
        return Trigger::Created;
    };
    let Some(observed) = status.observed_generation else {
        return Trigger::Created;
    };
    if sp.metadata.generation.is_some_and(|g| g != observed) {
        return Trigger::Updated;
    }
    if first_sighting {
        return Trigger::Resumed;
    }

    let due = status
        .next_refresh_time
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc));
    match due {
        None => Trigger::Refresh,
        Some(due) => match (due - now).to_std() {
            Ok(wait) if wait > SCHEDULE_SLACK => Trigger::Idle { wait },
            _ => Trigger::Refresh,
        },
    }
}

/// Delay until the next refresh after a successful sync.
///
/// The refresh interval, shortened to the token's lifetime minus the expiry skew when
/// the provider reports one, and never shorter than the initial delay.
#[must_use]
pub fn delay_after_success(config: &ControllerConfig, expires_in: Option<Duration>) -> Duration {
    let by_expiry = expires_in
        .map(|e| e.saturating_sub(config.token_expiry_skew))
        .unwrap_or(config.refresh_interval);
    config
        .refresh_interval
        .min(by_expiry)
        .max(config.initial_delay)
}

/// Delay until the next attempt after a failed sync.
///
/// Retryable failures carry their own delay; permanent ones wait for the next
/// refresh interval (or a spec edit).
#[must_use]
pub fn delay_after_failure(config: &ControllerConfig, kind: ErrorKind) -> Duration {
    match kind {
        ErrorKind::Retryable { delay } => delay,
        ErrorKind::Permanent => config.refresh_interval,
    }
}

/// `now + delay` as RFC3339.
#[must_use]
pub fn rfc3339_after(now: DateTime<Utc>, delay: Duration) -> String {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(now)
        .to_rfc3339()
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod trigger_tests;
