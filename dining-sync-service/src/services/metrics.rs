//! Prometheus metrics for dining-sync-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

/// Counter for reconciliation cycles by trigger and outcome.
pub static RECONCILE_CYCLES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dining_sync_reconcile_cycles_total",
        "Total number of reconciliation cycles",
        &["trigger", "status"]
    )
    .expect("Failed to register RECONCILE_CYCLES")
});

/// Histogram for reconciliation cycle duration by trigger.
pub static RECONCILE_CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "dining_sync_reconcile_cycle_duration_seconds",
        "Reconciliation cycle duration in seconds",
        &["trigger"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("Failed to register RECONCILE_CYCLE_DURATION")
});

/// Counter for reservations created via the service.
pub static RESERVATIONS_CREATED: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dining_sync_reservations_created_total",
        "Total number of reservations created",
        &["status"]
    )
    .expect("Failed to register RESERVATIONS_CREATED")
});

/// Counter for batch mark-as-left updates by outcome.
pub static MARK_LEFT_UPDATES: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "dining_sync_mark_left_updates_total",
        "Total number of mark-as-left status updates",
        &["status"]
    )
    .expect("Failed to register MARK_LEFT_UPDATES")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&RECONCILE_CYCLES);
    Lazy::force(&RECONCILE_CYCLE_DURATION);
    Lazy::force(&RESERVATIONS_CREATED);
    Lazy::force(&MARK_LEFT_UPDATES);
}

/// Get all metrics as Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Record a reconciliation cycle outcome.
pub fn record_cycle(trigger: &str, status: &str) {
    RECONCILE_CYCLES.with_label_values(&[trigger, status]).inc();
}

/// Record a reconciliation cycle duration.
pub fn record_cycle_duration(trigger: &str, duration_secs: f64) {
    RECONCILE_CYCLE_DURATION
        .with_label_values(&[trigger])
        .observe(duration_secs);
}

/// Record a reservation-creation attempt.
pub fn record_reservation_created(status: &str) {
    RESERVATIONS_CREATED.with_label_values(&[status]).inc();
}

/// Record a batch of mark-as-left updates.
pub fn record_mark_left(status: &str, count: u64) {
    MARK_LEFT_UPDATES
        .with_label_values(&[status])
        .inc_by(count as f64);
}
