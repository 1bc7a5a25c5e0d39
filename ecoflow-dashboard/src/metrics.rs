// EcoFlow Dashboard - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for intersection monitoring.
//!
//! This module defines all Prometheus metrics exposed by the dashboard
//! and provides functions to update them from predictions and decisions.

use ecoflow::{HealthImpact, IntersectionDecision, Mode, NormalizedPrediction};
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec, Counter,
    CounterVec, Encoder, Gauge, GaugeVec, TextEncoder,
};

lazy_static! {
    // ============================================================
    // Prediction Metrics
    // ============================================================

    /// Predicted traffic for the requested lead time.
    pub static ref PREDICTED_VEHICLES_PER_HOUR: Gauge = register_gauge!(
        "ecoflow_predicted_vehicles_per_hour",
        "Predicted traffic volume in vehicles per hour"
    ).unwrap();

    /// Width of the prediction band.
    pub static ref PREDICTION_RANGE_PER_MINUTE: Gauge = register_gauge!(
        "ecoflow_prediction_range_vehicles_per_minute",
        "Upper minus lower prediction bound in vehicles per minute"
    ).unwrap();

    /// Whether a trained model backs predictions (1 = trained).
    pub static ref MODEL_TRAINED: Gauge = register_gauge!(
        "ecoflow_model_trained",
        "Whether a trained forecasting model is loaded (1=yes, 0=no)"
    ).unwrap();

    /// Prediction cache hits.
    pub static ref PREDICTION_CACHE_HITS_TOTAL: Counter = register_counter!(
        "ecoflow_prediction_cache_hits_total",
        "Predictions served from the 15-minute cache"
    ).unwrap();

    // ============================================================
    // Air Quality Metrics
    // ============================================================

    /// Latest PM10 reading.
    pub static ref PM10_UGM3: Gauge = register_gauge!(
        "ecoflow_pm10_ugm3",
        "Latest PM10 concentration in micrograms per cubic meter"
    ).unwrap();

    /// Health impact tier of the latest reading.
    pub static ref HEALTH_SEVERITY_RANK: Gauge = register_gauge!(
        "ecoflow_health_severity_rank",
        "PM10 health impact tier (0=Excellent .. 4=Hazardous)"
    ).unwrap();

    // ============================================================
    // Intersection Metrics
    // ============================================================

    /// Current mode per intersection.
    pub static ref INTERSECTION_MODE: GaugeVec = register_gauge_vec!(
        "ecoflow_intersection_mode",
        "Intersection mode (0=NORMAL, 1=MAX_FLOW, 2=REROUTE)",
        &["intersection"]
    ).unwrap();

    /// Current green phase per intersection.
    pub static ref GREEN_LIGHT_SECONDS: GaugeVec = register_gauge_vec!(
        "ecoflow_green_light_seconds",
        "Green phase duration in seconds",
        &["intersection"]
    ).unwrap();

    /// Decisions taken (labeled by intersection and mode).
    pub static ref DECISIONS_TOTAL: CounterVec = register_counter_vec!(
        "ecoflow_decisions_total",
        "Total intersection decisions",
        &["intersection", "mode"]
    ).unwrap();

    // ============================================================
    // Dashboard Metrics
    // ============================================================

    /// Historical records loaded at startup.
    pub static ref HISTORY_RECORDS: Gauge = register_gauge!(
        "ecoflow_dashboard_history_records",
        "Traffic records loaded from history"
    ).unwrap();
}

/// Numeric value exported for a mode.
pub fn mode_value(mode: Mode) -> f64 {
    match mode {
        Mode::Normal => 0.0,
        Mode::MaxFlow => 1.0,
        Mode::Reroute => 2.0,
    }
}

/// Update prediction metrics.
pub fn update_prediction_metrics(prediction: &NormalizedPrediction) {
    PREDICTED_VEHICLES_PER_HOUR.set(prediction.vehicles_per_hour());
    PREDICTION_RANGE_PER_MINUTE.set(prediction.confidence_range());
}

/// Update air quality metrics.
pub fn update_air_quality_metrics(impact: &HealthImpact) {
    PM10_UGM3.set(impact.pm10);
    HEALTH_SEVERITY_RANK.set(f64::from(impact.severity_rank));
}

/// Record one decision.
pub fn record_decision(intersection: &str, decision: &IntersectionDecision) {
    INTERSECTION_MODE
        .with_label_values(&[intersection])
        .set(mode_value(decision.mode));
    GREEN_LIGHT_SECONDS
        .with_label_values(&[intersection])
        .set(f64::from(decision.green_light_seconds));
    DECISIONS_TOTAL
        .with_label_values(&[intersection, decision.mode.as_str()])
        .inc();
}

/// Reflect a reset intersection.
pub fn record_reset(intersection: &str, standard_green_secs: u32) {
    INTERSECTION_MODE
        .with_label_values(&[intersection])
        .set(mode_value(Mode::Normal));
    GREEN_LIGHT_SECONDS
        .with_label_values(&[intersection])
        .set(f64::from(standard_green_secs));
}

/// Update model and history metrics.
pub fn update_model_metrics(trained: bool, history_records: usize) {
    MODEL_TRAINED.set(if trained { 1.0 } else { 0.0 });
    HISTORY_RECORDS.set(history_records as f64);
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
