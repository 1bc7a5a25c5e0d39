// EcoFlow Dashboard - Shared application state
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! State shared across HTTP handlers.
//!
//! Predictions are cached per 15-minute wall-clock bucket and lead time.

use chrono::NaiveDateTime;
use ecoflow::series::floor_to_interval;
use ecoflow::{
    EcoflowConfig, IntersectionNetwork, NormalizedPrediction, TrafficPredictor, TrafficStatistics,
};
use serde::Serialize;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;

use crate::metrics;

/// Width of the prediction cache bucket (minutes).
pub const CACHE_BUCKET_MINUTES: u32 = 15;

/// Where a prediction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionSource {
    /// Trained forecaster
    Model,
    /// Time-of-day simulation (no model available)
    Simulated,
}

#[derive(Debug, Clone)]
struct CachedPrediction {
    bucket: NaiveDateTime,
    lead_minutes: i64,
    prediction: NormalizedPrediction,
    source: PredictionSource,
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: EcoflowConfig,
    pub network: RwLock<IntersectionNetwork>,
    pub predictor: TrafficPredictor,
    pub statistics: Option<TrafficStatistics>,
    pub history_records: usize,
    /// Intersection used when a request names none
    pub default_intersection: String,
    /// Latest PM10 reading (µg/m³)
    pub current_pm10: RwLock<f64>,
    /// Fall back to simulated predictions when untrained
    pub simulate: bool,
    prediction_cache: RwLock<Option<CachedPrediction>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: EcoflowConfig,
        network: IntersectionNetwork,
        predictor: TrafficPredictor,
        default_intersection: String,
        initial_pm10: f64,
    ) -> Self {
        Self {
            config,
            network: RwLock::new(network),
            predictor,
            statistics: None,
            history_records: 0,
            default_intersection,
            current_pm10: RwLock::new(initial_pm10),
            simulate: cfg!(feature = "simulate"),
            prediction_cache: RwLock::new(None),
            start_time: Instant::now(),
        }
    }

    /// Attach historical statistics.
    pub fn with_statistics(mut self, statistics: Option<TrafficStatistics>, records: usize) -> Self {
        self.statistics = statistics;
        self.history_records = records;
        self
    }

    /// Enable or disable the simulated fallback.
    pub fn with_simulation(mut self, simulate: bool) -> Self {
        self.simulate = simulate && cfg!(feature = "simulate");
        self
    }

    /// Prediction for `now + lead_minutes`, cached per 15-minute bucket.
    pub async fn prediction(
        &self,
        now: NaiveDateTime,
        lead_minutes: i64,
    ) -> Option<(NormalizedPrediction, PredictionSource, bool)> {
        let bucket = floor_to_interval(now, CACHE_BUCKET_MINUTES);

        if let Some(cached) = self.prediction_cache.read().await.as_ref() {
            if cached.bucket == bucket && cached.lead_minutes == lead_minutes {
                metrics::PREDICTION_CACHE_HITS_TOTAL.inc();
                return Some((cached.prediction, cached.source, true));
            }
        }

        let (prediction, source) = match self.predictor.current_prediction(now, lead_minutes) {
            Some(p) => (p, PredictionSource::Model),
            None => (self.simulated(now, lead_minutes)?, PredictionSource::Simulated),
        };

        debug!(
            "Computed {:?} prediction for bucket {}: {:.0} vehicles/hr",
            source,
            bucket,
            prediction.vehicles_per_hour()
        );
        metrics::update_prediction_metrics(&prediction);

        *self.prediction_cache.write().await = Some(CachedPrediction {
            bucket,
            lead_minutes,
            prediction,
            source,
        });

        Some((prediction, source, false))
    }

    #[cfg(feature = "simulate")]
    fn simulated(&self, now: NaiveDateTime, lead_minutes: i64) -> Option<NormalizedPrediction> {
        if !self.simulate {
            return None;
        }
        let mut rng = rand::thread_rng();
        Some(ecoflow_testdata::simulate_prediction(now, lead_minutes, &mut rng))
    }

    #[cfg(not(feature = "simulate"))]
    fn simulated(&self, _now: NaiveDateTime, _lead_minutes: i64) -> Option<NormalizedPrediction> {
        None
    }
}
