//! Prometheus metrics collection for gsbot.
//!
//! - `gsbot_command_total{command}` - Routes dispatched
//! - `gsbot_command_duration_seconds{command}` - Route latency histogram
//! - `gsbot_command_errors_total{command,error}` - Route errors by kind
//! - `gsbot_pairing_events_total{event}` - Upstream pairing items relayed
//! - `gsbot_status_polls_total{outcome}` - How status polls ended
//!
//! Recorders are no-ops until [`init`] has run.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Routes
// ========================================================================

/// Routes dispatched, by route key.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Route latency, including the middleware chain.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Route errors by route key and error kind.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Session and Poller
// ========================================================================

pub static PAIRING_EVENTS: OnceLock<IntCounterVec> = OnceLock::new();

/// Status polls by outcome (terminal, timeout, error, abandoned).
pub static STATUS_POLLS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("gsbot_command_total", "Bot routes dispatched"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("gsbot_command_duration_seconds", "Bot route latency")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("gsbot_command_errors_total", "Bot route errors by kind"), &["command", "error"]));
    register!(PAIRING_EVENTS, IntCounterVec::new(Opts::new("gsbot_pairing_events_total", "Device pairing events"), &["event"]));
    register!(STATUS_POLLS, IntCounterVec::new(Opts::new("gsbot_status_polls_total", "Server status polls by outcome"), &["outcome"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recorders
// ============================================================================

fn get_counter_vec(metric: &OnceLock<IntCounterVec>) -> Option<&IntCounterVec> {
    metric.get()
}

fn get_histogram_vec(metric: &OnceLock<HistogramVec>) -> Option<&HistogramVec> {
    metric.get()
}

/// Record a route execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = get_counter_vec(&COMMAND_COUNTER) {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = get_histogram_vec(&COMMAND_LATENCY) {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a route error.
#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = get_counter_vec(&COMMAND_ERRORS) {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_pairing_event(event: &str) {
    if let Some(c) = get_counter_vec(&PAIRING_EVENTS) {
        c.with_label_values(&[event]).inc();
    }
}

#[inline]
pub fn record_status_poll(outcome: &str) {
    if let Some(c) = get_counter_vec(&STATUS_POLLS) {
        c.with_label_values(&[outcome]).inc();
    }
}
