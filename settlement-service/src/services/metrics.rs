//! Prometheus metrics for settlement-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec, TextEncoder,
};

/// Settlements computed, by mode (preview vs clearance).
pub static SETTLEMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_settlements_total",
        "Total number of settlements computed",
        &["mode"] // preview, clearance
    )
    .expect("Failed to register settlements_total")
});

/// Clearance records by status they entered.
pub static CLEARANCES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_clearances_total",
        "Total number of clearance records by status",
        &["status"]
    )
    .expect("Failed to register clearances_total")
});

/// Settled monetary amounts by leg of the split.
pub static SETTLEMENT_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_amount_total",
        "Total settled amount by settlement leg",
        &["leg"] // total_sales, platform_commission, store_payout, brand_total
    )
    .expect("Failed to register settlement_amount_total")
});

/// Inventory lines that failed the quantity reconciliation check.
pub static INVENTORY_WARNINGS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "settlement_inventory_warnings_total",
        "Total number of inventory lines whose quantities did not reconcile"
    )
    .expect("Failed to register inventory_warnings_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "settlement_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "settlement_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&SETTLEMENTS_TOTAL);
    Lazy::force(&CLEARANCES_TOTAL);
    Lazy::force(&SETTLEMENT_AMOUNT_TOTAL);
    Lazy::force(&INVENTORY_WARNINGS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
