use prometheus_exporter::prometheus::{
    HistogramTimer, HistogramVec, IntCounterVec, IntGaugeVec, default_registry,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_gauge_vec_with_registry,
};

// Provisioning each metrics
lazy_static::lazy_static! {
    pub static ref HEAD_SLOT: IntGaugeVec = register_int_gauge_vec_with_registry!(
        "beacon_head_slot",
        "The slot of the current fork choice head",
        &[],
        default_registry()
    ).expect("failed to create HEAD_SLOT int gauge vec");

    pub static ref JUSTIFIED_EPOCH: IntGaugeVec = register_int_gauge_vec_with_registry!(
        "beacon_justified_epoch",
        "The epoch of the justified checkpoint fork choice starts from",
        &[],
        default_registry()
    ).expect("failed to create JUSTIFIED_EPOCH int gauge vec");

    pub static ref FINALIZED_EPOCH: IntGaugeVec = register_int_gauge_vec_with_registry!(
        "beacon_finalized_epoch",
        "The epoch of the finalized checkpoint",
        &[],
        default_registry()
    ).expect("failed to create FINALIZED_EPOCH int gauge vec");

    // Fork-Choice Metrics
    pub static ref FORK_CHOICE_HEAD_TIME: HistogramVec = register_histogram_vec_with_registry!(
        "beacon_fork_choice_head_time_seconds",
        "Time taken to walk the block tree and select a head",
        &[],
        default_registry()
    ).expect("failed to create FORK_CHOICE_HEAD_TIME histogram vec");

    pub static ref VOTES_PROCESSED_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "beacon_fork_choice_votes_processed_total",
        "Total number of latest votes written to the vote ledger",
        &[],
        default_registry()
    ).expect("failed to create VOTES_PROCESSED_TOTAL int counter vec");

    pub static ref CHECKPOINT_STATE_CACHE_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "beacon_checkpoint_state_cache_total",
        "Checkpoint state cache lookups by result",
        &["result"],
        default_registry()
    ).expect("failed to create CHECKPOINT_STATE_CACHE_TOTAL int counter vec");

    // Storage Metrics
    pub static ref ATTESTATIONS_SAVED_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "beacon_attestations_saved_total",
        "Total number of attestations written to the database",
        &[],
        default_registry()
    ).expect("failed to create ATTESTATIONS_SAVED_TOTAL int counter vec");
}

/// Set the value of a gauge metric
pub fn set_int_gauge_vec(gauge_vec: &IntGaugeVec, value: i64, label_values: &[&str]) {
    gauge_vec.with_label_values(label_values).set(value);
}

/// Start a timer for a histogram metric
pub fn start_timer(histogram_vec: &HistogramVec, label_values: &[&str]) -> HistogramTimer {
    histogram_vec.with_label_values(label_values).start_timer()
}

pub fn stop_timer(timer: HistogramTimer) {
    timer.observe_duration()
}

/// Increment a counter metric
pub fn inc_int_counter_vec(counter_vec: &IntCounterVec, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc();
}

/// Increment a counter metric by ``value``
pub fn inc_int_counter_vec_by(counter_vec: &IntCounterVec, value: u64, label_values: &[&str]) {
    counter_vec.with_label_values(label_values).inc_by(value);
}
