// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the dnsvc engine.
//!
//! All metrics carry the namespace prefix `dnsvc_`.
//!
//! # Metrics Categories
//!
//! - **Analysis Metrics** - Track analysis passes, their outcome and duration
//! - **Service Metrics** - Track recognized services, orphans and dropped records
//! - **Synthesis Metrics** - Track services unable to generate their records
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsvc::metrics::{gather_metrics, record_analysis_success};
//!
//! record_analysis_success(std::time::Duration::from_millis(3));
//! println!("{}", gather_metrics().unwrap());
//! ```

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all dnsvc metrics
const METRICS_NAMESPACE: &str = "dnsvc";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Analysis Metrics
// ============================================================================

/// Total number of analysis passes by outcome
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static ANALYSES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_analyses_total"),
        "Total number of zone analysis passes by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of analysis passes in seconds
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static ANALYSIS_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_analysis_duration_seconds"),
        "Duration of zone analysis passes in seconds",
    )
    .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]);
    let histogram = HistogramVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Service Metrics
// ============================================================================

/// Total number of services produced by recognizers, by service type. Orphans are
/// counted by `dnsvc_orphan_records_total` instead.
///
/// Labels:
/// - `service_type`: Registry type key (e.g., `abstract.MXs`)
pub static SERVICES_RECOGNIZED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_services_recognized_total"),
        "Total number of services produced by recognizers by service type",
    );
    let counter = CounterVec::new(opts, &["service_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of records left unrecognized and wrapped as orphans
pub static ORPHAN_RECORDS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_orphan_records_total"),
        "Total number of records wrapped as orphan services",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of records dropped without a service (DNSSEC artifacts, bookkeeping)
pub static DROPPED_RECORDS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_dropped_records_total"),
        "Total number of records dropped during analysis",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Synthesis Metrics
// ============================================================================

/// Total number of services that failed to generate records, by service type
///
/// Labels:
/// - `service_type`: Registry type key
pub static SYNTHESIS_FAILURES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_synthesis_failures_total"),
        "Total number of services unable to generate their records by service type",
    );
    let counter = CounterVec::new(opts, &["service_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful analysis pass
///
/// # Arguments
/// * `duration` - Duration of the pass
pub fn record_analysis_success(duration: Duration) {
    ANALYSES_TOTAL.with_label_values(&["success"]).inc();
    ANALYSIS_DURATION_SECONDS
        .with_label_values(&["success"])
        .observe(duration.as_secs_f64());
}

/// Record an aborted analysis pass
///
/// # Arguments
/// * `duration` - Duration of the pass before it aborted
pub fn record_analysis_error(duration: Duration) {
    ANALYSES_TOTAL.with_label_values(&["error"]).inc();
    ANALYSIS_DURATION_SECONDS
        .with_label_values(&["error"])
        .observe(duration.as_secs_f64());
}

/// Record one service produced by analysis
///
/// # Arguments
/// * `service_type` - Registry type key of the service
pub fn record_service_recognized(service_type: &str) {
    SERVICES_RECOGNIZED_TOTAL
        .with_label_values(&[service_type])
        .inc();
}

/// Record orphaned and dropped record counts of one pass
pub fn record_leftovers(orphans: usize, dropped: usize) {
    ORPHAN_RECORDS_TOTAL.inc_by(orphans as u64);
    DROPPED_RECORDS_TOTAL.inc_by(dropped as u64);
}

/// Record a service unable to generate its records
///
/// # Arguments
/// * `service_type` - Registry type key of the failing service
pub fn record_synthesis_failure(service_type: &str) {
    SYNTHESIS_FAILURES_TOTAL
        .with_label_values(&[service_type])
        .inc();
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
