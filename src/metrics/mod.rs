//! Prometheus metrics for the windowed consumer and its pipelines
//!
//! This module tracks:
//! - Ingestion: items moved from the inbound queue to the buffer
//! - Windows: processing time, failures, filtered items, checkpoints
//! - Detection: breaking topics, active and frozen clusters
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, register_histogram_vec, Counter,
    CounterVec, Encoder, GaugeVec, HistogramVec, TextEncoder,
};
use std::sync::{Mutex, OnceLock, PoisonError};

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all consumer metrics
struct ConsumerMetrics {
    items_consumed: Counter,
    items_filtered: CounterVec,
    windows_processed: CounterVec,
    window_failures: CounterVec,
    window_duration: HistogramVec,
    checkpoints: CounterVec,
    breaking_topics: CounterVec,
    active_clusters: GaugeVec,
    frozen_clusters: GaugeVec,
}

/// Global storage for consumer metrics
static CONSUMER_METRICS: OnceLock<ConsumerMetrics> = OnceLock::new();

/// Whether initialization was attempted; held while registering
static METRICS_INIT_ATTEMPTED: Mutex<bool> = Mutex::new(false);

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, subsequent metric operations become no-ops.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = eventline::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    let mut attempted = METRICS_INIT_ATTEMPTED
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if *attempted {
        return Ok(());
    }
    *attempted = true;

    let consumer = ConsumerMetrics {
        items_consumed: register_counter!(
            "eventline_items_consumed_total",
            "Total items moved from the inbound queue to the buffer"
        )?,
        items_filtered: register_counter_vec!(
            "eventline_items_filtered_total",
            "Total items rejected by a pipeline's filter",
            &["pipeline"]
        )?,
        windows_processed: register_counter_vec!(
            "eventline_windows_processed_total",
            "Total windows processed",
            &["pipeline"]
        )?,
        window_failures: register_counter_vec!(
            "eventline_window_failures_total",
            "Total windows whose processing failed",
            &["pipeline"]
        )?,
        window_duration: register_histogram_vec!(
            "eventline_window_duration_seconds",
            "Time spent processing a window in seconds",
            &["pipeline"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
        checkpoints: register_counter_vec!(
            "eventline_checkpoints_total",
            "Total checkpoints written to the nutrition store",
            &["pipeline"]
        )?,
        breaking_topics: register_counter_vec!(
            "eventline_breaking_topics_total",
            "Total breaking topics reported",
            &["pipeline"]
        )?,
        active_clusters: register_gauge_vec!(
            "eventline_active_clusters",
            "Clusters that can still receive documents",
            &["pipeline"]
        )?,
        frozen_clusters: register_gauge_vec!(
            "eventline_frozen_clusters",
            "Frozen clusters kept in memory",
            &["pipeline"]
        )?,
    };

    CONSUMER_METRICS
        .set(consumer)
        .map_err(|_| "Consumer metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    CONSUMER_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn gather_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record items moved into the buffer
pub fn record_items_consumed(count: usize) {
    if let Some(m) = CONSUMER_METRICS.get() {
        m.items_consumed.inc_by(count as f64);
    }
}

/// Record a processed window
pub fn record_window(
    pipeline: &str,
    duration_secs: f64,
    filtered: usize,
    checkpoint: bool,
    topics: usize,
) {
    let Some(m) = CONSUMER_METRICS.get() else {
        return;
    };

    m.windows_processed.with_label_values(&[pipeline]).inc();
    m.window_duration
        .with_label_values(&[pipeline])
        .observe(duration_secs);
    if filtered > 0 {
        m.items_filtered
            .with_label_values(&[pipeline])
            .inc_by(filtered as f64);
    }
    if checkpoint {
        m.checkpoints.with_label_values(&[pipeline]).inc();
    }
    if topics > 0 {
        m.breaking_topics
            .with_label_values(&[pipeline])
            .inc_by(topics as f64);
    }
}

/// Record a window whose processing failed
pub fn record_window_failure(pipeline: &str) {
    if let Some(m) = CONSUMER_METRICS.get() {
        m.window_failures.with_label_values(&[pipeline]).inc();
    }
}

/// Update cluster counts
pub fn set_clusters(pipeline: &str, active: usize, frozen: usize) {
    if let Some(m) = CONSUMER_METRICS.get() {
        m.active_clusters
            .with_label_values(&[pipeline])
            .set(active as f64);
        m.frozen_clusters
            .with_label_values(&[pipeline])
            .set(frozen as f64);
    }
}

// ============================================================================
// Tests
// ============================================================================
