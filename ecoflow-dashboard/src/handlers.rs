// EcoFlow Dashboard - HTTP handlers
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDateTime};
use ecoflow::{
    classify, DecisionRecord, HealthImpact, IntersectionDecision, Mode, NormalizedPrediction,
    TrafficStatistics,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::metrics::{self, encode_metrics};
use crate::state::{AppState, PredictionSource};

pub type SharedState = Arc<AppState>;

/// Errors returned to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown intersection: {0}")]
    UnknownIntersection(String),

    #[error("{0}")]
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownIntersection(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Root handler - shows a simple HTML page.
pub async fn root_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>EcoFlow Dashboard</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; }
        h1 { color: #2c3e50; }
        a { color: #3498db; text-decoration: none; }
        a:hover { text-decoration: underline; }
        .endpoints { background: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0; }
        .endpoint { margin: 10px 0; }
        code { background: #e9ecef; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <h1>EcoFlow Dashboard</h1>
    <p>Smart traffic lights balancing traffic flow against air quality.</p>

    <div class="endpoints">
        <h2>Endpoints</h2>
        <div class="endpoint"><a href="/status">/status</a> - Intersections and model status (JSON)</div>
        <div class="endpoint"><a href="/prediction">/prediction</a> - Traffic prediction, <code>?lead_minutes=15</code></div>
        <div class="endpoint"><a href="/air-quality">/air-quality</a> - PM10 health impact, <code>?pm10=42</code></div>
        <div class="endpoint"><a href="/statistics">/statistics</a> - Historical traffic statistics</div>
        <div class="endpoint"><code>GET /intersections/{name}/history</code> - Decision history</div>
        <div class="endpoint"><code>POST /decide</code> - Run a decision</div>
        <div class="endpoint"><code>POST /intersections/{name}/reset</code> - Reset an intersection</div>
        <div class="endpoint"><a href="/metrics">/metrics</a> - Prometheus metrics</div>
        <div class="endpoint"><a href="/health">/health</a> - Health check</div>
    </div>

    <h2>Modes</h2>
    <ul>
        <li><code>NORMAL</code> - Standard operation, 30s green</li>
        <li><code>MAX_FLOW</code> - Traffic above capacity, green extended to 60s</li>
        <li><code>REROUTE</code> - PM10 above 50 µg/m³, digital signs set to DETOUR</li>
    </ul>
</body>
</html>"#,
    )
}

/// Metrics handler - returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    let metrics = encode_metrics();
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        metrics,
    )
}

/// Health check handler.
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Status information response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_secs: u64,
    pub model_trained: bool,
    pub direction_models: bool,
    pub history_records: usize,
    pub current_pm10: f64,
    pub default_intersection: String,
    pub intersections: BTreeMap<String, Mode>,
}

/// Status handler - returns JSON status information.
pub async fn status_handler(State(state): State<SharedState>) -> Json<StatusResponse> {
    let intersections = state.network.read().await.status_snapshot();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model_trained: state.predictor.is_trained(),
        direction_models: state.predictor.has_direction_models(),
        history_records: state.history_records,
        current_pm10: *state.current_pm10.read().await,
        default_intersection: state.default_intersection.clone(),
        intersections,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictionQuery {
    pub lead_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: NormalizedPrediction,
    pub vehicles_per_hour: f64,
    pub source: PredictionSource,
    pub cached: bool,
}

/// Prediction handler.
pub async fn prediction_handler(
    State(state): State<SharedState>,
    Query(query): Query<PredictionQuery>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let lead = query
        .lead_minutes
        .unwrap_or(state.config.prediction.default_lead_minutes);
    let (prediction, source, cached) = state
        .prediction(now(), lead)
        .await
        .ok_or_else(|| ApiError::Unavailable("No trained model available".to_string()))?;

    Ok(Json(PredictionResponse {
        vehicles_per_hour: prediction.vehicles_per_hour(),
        prediction,
        source,
        cached,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct AirQualityQuery {
    pub pm10: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AirQualityResponse {
    pub impact: HealthImpact,
    pub who_limit: f64,
    pub exceeds_who_limit: bool,
}

/// Air quality handler. Without `pm10`, classifies the current reading.
pub async fn air_quality_handler(
    State(state): State<SharedState>,
    Query(query): Query<AirQualityQuery>,
) -> Json<AirQualityResponse> {
    let pm10 = match query.pm10 {
        Some(value) => value,
        None => *state.current_pm10.read().await,
    };
    let impact = classify(pm10);
    let who_limit = state.config.air_quality.who_pm10_limit;
    Json(AirQualityResponse {
        exceeds_who_limit: impact.exceeds_guideline(who_limit),
        who_limit,
        impact,
    })
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    #[serde(flatten)]
    pub statistics: TrafficStatistics,
    pub rush_hours_label: String,
    pub quiet_hours_label: String,
}

/// Historical statistics handler.
pub async fn statistics_handler(
    State(state): State<SharedState>,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let statistics = state
        .statistics
        .clone()
        .ok_or_else(|| ApiError::Unavailable("No traffic history loaded".to_string()))?;
    Ok(Json(StatisticsResponse {
        rush_hours_label: statistics.rush_hours_formatted(),
        quiet_hours_label: statistics.quiet_hours_formatted(),
        statistics,
    }))
}

/// Decision request. Missing values come from the current prediction and
/// the latest PM10 reading.
#[derive(Debug, Default, Deserialize)]
pub struct DecideRequest {
    pub intersection: Option<String>,
    pub predicted_traffic: Option<f64>,
    pub pm10: Option<f64>,
    pub lead_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct DecideResponse {
    pub intersection: String,
    pub predicted_traffic: f64,
    pub pm10: f64,
    #[serde(flatten)]
    pub decision: IntersectionDecision,
    pub action: &'static str,
    pub status_label: String,
    pub health: HealthImpact,
}

/// Decision handler.
pub async fn decide_handler(
    State(state): State<SharedState>,
    Json(request): Json<DecideRequest>,
) -> Result<Json<DecideResponse>, ApiError> {
    let name = request
        .intersection
        .unwrap_or_else(|| state.default_intersection.clone());

    let predicted_traffic = match request.predicted_traffic {
        Some(value) => value,
        None => {
            let lead = request
                .lead_minutes
                .unwrap_or(state.config.prediction.default_lead_minutes);
            let (prediction, _, _) = state
                .prediction(now(), lead)
                .await
                .ok_or_else(|| ApiError::Unavailable("No traffic prediction available".to_string()))?;
            prediction.vehicles_per_hour()
        }
    };

    let pm10 = match request.pm10 {
        Some(value) => value,
        None => *state.current_pm10.read().await,
    };

    let decision = {
        let mut network = state.network.write().await;
        let policy = network
            .get_mut(&name)
            .ok_or_else(|| ApiError::UnknownIntersection(name.clone()))?;
        policy.decide(predicted_traffic, pm10)
    };

    if request.pm10.is_some() {
        *state.current_pm10.write().await = pm10;
    }

    let health = classify(pm10);
    metrics::record_decision(&name, &decision);
    metrics::update_air_quality_metrics(&health);

    if decision.mode == Mode::Reroute {
        warn!("{}: {}", name, decision.action());
    } else {
        info!("{}: {}", name, decision.status_label());
    }

    Ok(Json(DecideResponse {
        intersection: name,
        predicted_traffic,
        pm10,
        action: decision.action(),
        status_label: decision.status_label(),
        decision,
        health,
    }))
}

/// Decision history handler.
pub async fn history_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<DecisionRecord>>, ApiError> {
    let network = state.network.read().await;
    let policy = network
        .get(&name)
        .ok_or_else(|| ApiError::UnknownIntersection(name.clone()))?;
    Ok(Json(policy.history().to_vec()))
}

/// Reset handler.
pub async fn reset_handler(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut network = state.network.write().await;
    let policy = network
        .get_mut(&name)
        .ok_or_else(|| ApiError::UnknownIntersection(name.clone()))?;
    policy.reset();
    metrics::record_reset(&name, policy.green_light_seconds());
    info!("{}: reset", name);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoflow::{
        EcoflowConfig, IntersectionNetwork, PredictionConfig, TrafficPredictor, TrafficRecord,
    };

    fn test_state() -> SharedState {
        let mut network = IntersectionNetwork::new();
        network.add("Center", 120.0);
        network.add("Ring", 300.0);
        Arc::new(
            AppState::new(
                EcoflowConfig::default(),
                network,
                TrafficPredictor::new(PredictionConfig::default()),
                "Center".to_string(),
                20.0,
            )
            .with_simulation(false),
        )
    }

    fn decide(intersection: Option<&str>, traffic: Option<f64>, pm10: Option<f64>) -> DecideRequest {
        DecideRequest {
            intersection: intersection.map(str::to_string),
            predicted_traffic: traffic,
            pm10,
            lead_minutes: None,
        }
    }

    #[tokio::test]
    async fn test_decide_reference_scenarios() {
        let state = test_state();

        let Json(normal) = decide_handler(State(state.clone()), Json(decide(None, Some(50.0), Some(20.0))))
            .await
            .unwrap();
        assert_eq!(normal.intersection, "Center");
        assert_eq!(normal.decision.mode, Mode::Normal);

        let Json(rush) = decide_handler(State(state.clone()), Json(decide(None, Some(150.0), Some(25.0))))
            .await
            .unwrap();
        assert_eq!(rush.decision.mode, Mode::MaxFlow);
        assert_eq!(rush.status_label, "MAX FLOW (Green: 60s)");

        let Json(toxic) = decide_handler(State(state.clone()), Json(decide(None, Some(80.0), Some(65.0))))
            .await
            .unwrap();
        assert_eq!(toxic.decision.mode, Mode::Reroute);
        assert_eq!(*state.current_pm10.read().await, 65.0);

        let Json(history) = history_handler(State(state.clone()), Path("Center".to_string()))
            .await
            .unwrap();
        assert_eq!(history.len(), 3);

        let Json(status) = status_handler(State(state)).await;
        assert_eq!(status.intersections["Center"], Mode::Reroute);
        assert_eq!(status.intersections["Ring"], Mode::Normal);
    }

    #[tokio::test]
    async fn test_decide_uses_current_pm10() {
        let state = test_state();
        let Json(response) = decide_handler(State(state), Json(decide(Some("Ring"), Some(10.0), None)))
            .await
            .unwrap();
        assert_eq!(response.pm10, 20.0);
        assert_eq!(response.decision.mode, Mode::Normal);
    }

    #[tokio::test]
    async fn test_unknown_intersection() {
        let state = test_state();
        let result = decide_handler(State(state.clone()), Json(decide(Some("Nowhere"), Some(10.0), Some(99.0)))).await;
        assert!(matches!(result, Err(ApiError::UnknownIntersection(_))));
        // Rejected request leaves the air quality reading alone
        assert_eq!(*state.current_pm10.read().await, 20.0);

        let result = reset_handler(State(state), Path("Nowhere".to_string())).await;
        assert!(matches!(result, Err(ApiError::UnknownIntersection(_))));
    }

    #[tokio::test]
    async fn test_decide_without_prediction_is_unavailable() {
        let state = test_state();
        let result = decide_handler(State(state), Json(decide(None, None, Some(10.0)))).await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_reset_clears_history() {
        let state = test_state();
        decide_handler(State(state.clone()), Json(decide(Some("Ring"), Some(500.0), Some(10.0))))
            .await
            .unwrap();

        let status = reset_handler(State(state.clone()), Path("Ring".to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(history) = history_handler(State(state), Path("Ring".to_string()))
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_air_quality() {
        let state = test_state();
        let Json(response) = air_quality_handler(State(state.clone()), Query(AirQualityQuery { pm10: Some(47.0) })).await;
        assert_eq!(response.impact.level, ecoflow::HealthLevel::Moderate);
        assert!(response.exceeds_who_limit);

        let Json(current) = air_quality_handler(State(state), Query(AirQualityQuery::default())).await;
        assert_eq!(current.impact.pm10, 20.0);
        assert!(!current.exceeds_who_limit);
    }

    #[tokio::test]
    async fn test_prediction_from_trained_model() {
        let start = Local::now().naive_local() - chrono::Duration::days(14);
        let records: Vec<TrafficRecord> = (0..14 * 24 * 60)
            .map(|m| TrafficRecord::new(start + chrono::Duration::minutes(m), 1.0, 1.0))
            .collect();
        let mut predictor = TrafficPredictor::new(PredictionConfig::default());
        predictor.train(&ecoflow::TrafficSeries::from_records(&records, 15), false);

        let state = Arc::new(
            AppState::new(
                EcoflowConfig::default(),
                IntersectionNetwork::new(),
                predictor,
                "Center".to_string(),
                20.0,
            )
            .with_simulation(false),
        );

        let Json(response) = prediction_handler(State(state.clone()), Query(PredictionQuery::default()))
            .await
            .unwrap();
        assert_eq!(response.source, PredictionSource::Model);
        assert!((response.vehicles_per_hour - 120.0).abs() < 1e-9);

        // Lead times beyond the calendar answer 503 instead of crashing
        let result = prediction_handler(
            State(state.clone()),
            Query(PredictionQuery { lead_minutes: Some(i64::MAX) }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));

        let request = DecideRequest {
            lead_minutes: Some(-10_000_000_000_000),
            ..Default::default()
        };
        let result = decide_handler(State(state), Json(request)).await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_statistics_unavailable_without_history() {
        let result = statistics_handler(State(test_state())).await;
        assert!(matches!(result, Err(ApiError::Unavailable(_))));
    }
}
