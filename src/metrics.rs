// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the ArgoCD service principal operator.
//!
//! All metrics carry the namespace prefix `argocd_sp_k8sware_com_` (prometheus-safe
//! version of "argocd-sp.k8sware.com") and are exposed on `/metrics`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconciliations by trigger and outcome, and their duration
//! - **Token Metrics** - Client credentials exchanges and their latency
//! - **Secret Metrics** - Derived secret creations, replacements and deletions
//! - **Error Metrics** - Failures by reason and classification
//!
//! # Example
//!
//! ```rust,no_run
//! use argocd_sp_operator::metrics::{record_reconciliation, gather_metrics};
//!
//! record_reconciliation("refresh", "success", std::time::Duration::from_millis(250));
//! let text = gather_metrics().unwrap();
//! assert!(text.contains("argocd_sp_k8sware_com_reconciliations_total"));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "argocd_sp_k8sware_com";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by trigger and status
///
/// Labels:
/// - `trigger`: What started the reconciliation (`created`, `updated`, `resumed`, `refresh`, `idle`, `delete`)
/// - `status`: Outcome (`success`, `error`, `skipped`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by trigger and status",
    );
    let counter = CounterVec::new(opts, &["trigger", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
///
/// Labels:
/// - `trigger`: What started the reconciliation
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by trigger",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["trigger"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Token Metrics
// ============================================================================

/// Total number of client credentials exchanges
///
/// Labels:
/// - `outcome`: `success` or `failure`
pub static TOKEN_EXCHANGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_token_exchanges_total"),
        "Total number of client credentials exchanges by outcome",
    );
    let counter = CounterVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Latency of client credentials exchanges in seconds
///
/// Labels:
/// - `outcome`: `success` or `failure`
pub static TOKEN_EXCHANGE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_token_exchange_duration_seconds"),
        "Latency of client credentials exchanges in seconds",
    )
    .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["outcome"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Secret Metrics
// ============================================================================

/// Total number of derived secret operations
///
/// Labels:
/// - `operation`: `created`, `replaced`, `deleted`, `not_found`
pub static SECRET_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_secret_operations_total"),
        "Total number of derived secret operations by type",
    );
    let counter = CounterVec::new(opts, &["operation"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of reconciliation errors
///
/// Labels:
/// - `reason`: Status reason of the error (e.g., `SecretError`, `TokenError`)
/// - `kind`: `permanent` or `retryable`
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of reconciliation errors by reason and kind",
    );
    let counter = CounterVec::new(opts, &["reason", "kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a finished reconciliation
///
/// # Arguments
/// * `trigger` - What started it (e.g., `refresh`)
/// * `status` - `success`, `error` or `skipped`
/// * `duration` - Wall time spent
pub fn record_reconciliation(trigger: &str, status: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[trigger, status])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[trigger])
        .observe(duration.as_secs_f64());
}

/// Record a token exchange
pub fn record_token_exchange(success: bool, duration: Duration) {
    let outcome = if success { "success" } else { "failure" };
    TOKEN_EXCHANGES_TOTAL.with_label_values(&[outcome]).inc();
    TOKEN_EXCHANGE_DURATION_SECONDS
        .with_label_values(&[outcome])
        .observe(duration.as_secs_f64());
}

/// Record a derived secret operation (`created`, `replaced`, `deleted`, `not_found`)
pub fn record_secret_operation(operation: &str) {
    SECRET_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Record an error
///
/// # Arguments
/// * `reason` - Status reason of the error
/// * `kind` - `permanent` or `retryable`
pub fn record_error(reason: &str, kind: &str) {
    ERRORS_TOTAL.with_label_values(&[reason, kind]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation() {
        let duration = Duration::from_millis(500);

        record_reconciliation("test-trigger", "success", duration);

        let counter = RECONCILIATION_TOTAL.with_label_values(&["test-trigger", "success"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&["test-trigger"]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_token_exchange() {
        record_token_exchange(false, Duration::from_millis(20));

        let counter = TOKEN_EXCHANGES_TOTAL.with_label_values(&["failure"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_error() {
        record_error("TestReason", "retryable");

        let counter = ERRORS_TOTAL.with_label_values(&["TestReason", "retryable"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_secret_operation("created");

        let result = gather_metrics();
        assert!(result.is_ok(), "Gathering metrics should succeed");

        let metrics_text = result.unwrap();
        assert!(
            metrics_text.contains("argocd_sp_k8sware_com"),
            "Metrics should contain namespace prefix"
        );
        assert!(
            metrics_text.contains("secret_operations_total"),
            "Metrics should contain secret operation counter"
        );
    }
}
