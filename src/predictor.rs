// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Traffic predictor
//!
//! Owns one forecaster for total traffic and, optionally, one per direction.
//! Answers "how much traffic in N minutes" as a [`NormalizedPrediction`].

use crate::config::PredictionConfig;
use crate::forecast::{future_grid, horizon_grid, ForecastPoint, Forecaster};
use crate::normalizer::{NormalizedPrediction, PredictionNormalizer};
use crate::profile::SeasonalProfileForecaster;
use crate::series::{floor_to_interval, TrafficSeries};
use chrono::{Duration, Local, NaiveDateTime};

/// Forecasters plus the normalization that turns their output into rates
#[derive(Debug, Clone)]
pub struct TrafficPredictor<F = SeasonalProfileForecaster> {
    normalizer: PredictionNormalizer,
    /// Template cloned for each model before training
    prototype: F,
    total: F,
    directions: Option<(F, F)>,
    trained_at: Option<NaiveDateTime>,
    source_id: Option<String>,
}

impl TrafficPredictor<SeasonalProfileForecaster> {
    /// Predictor backed by the seasonal profile forecaster
    pub fn new(config: PredictionConfig) -> Self {
        let prototype = SeasonalProfileForecaster::new(config.sample_interval_minutes);
        Self::with_forecaster(config, prototype)
    }
}

impl Default for TrafficPredictor<SeasonalProfileForecaster> {
    fn default() -> Self {
        Self::new(PredictionConfig::default())
    }
}

impl<F: Forecaster + Clone> TrafficPredictor<F> {
    /// Predictor using clones of `prototype` as its models
    pub fn with_forecaster(config: PredictionConfig, prototype: F) -> Self {
        Self {
            normalizer: PredictionNormalizer::new(config),
            total: prototype.clone(),
            prototype,
            directions: None,
            trained_at: None,
            source_id: None,
        }
    }

    /// Rebuild a predictor from already trained models
    pub fn from_models(
        config: PredictionConfig,
        total: F,
        directions: Option<(F, F)>,
        trained_at: Option<NaiveDateTime>,
        source_id: Option<String>,
    ) -> Self {
        Self {
            normalizer: PredictionNormalizer::new(config),
            prototype: total.clone(),
            total,
            directions,
            trained_at,
            source_id,
        }
    }

    /// Fit the total model, and direction models when asked.
    ///
    /// Direction models are only fitted when both direction series have
    /// data. An empty total series leaves the predictor untrained.
    pub fn train(&mut self, series: &TrafficSeries, train_directions: bool) {
        let mut total = self.prototype.clone();
        total.fit(&series.total);
        self.total = total;

        self.directions = None;
        if train_directions && !series.direction_a.is_empty() && !series.direction_b.is_empty() {
            let mut first = self.prototype.clone();
            let mut second = self.prototype.clone();
            first.fit(&series.direction_a);
            second.fit(&series.direction_b);
            self.directions = Some((first, second));
        }

        if !self.total.is_trained() {
            log::warn!("Training series is empty, predictor stays untrained");
            self.trained_at = None;
            self.source_id = None;
            self.directions = None;
            return;
        }

        self.trained_at = Some(Local::now().naive_local());
        self.source_id = series.source_id.clone();

        log::info!(
            "Trained on {} intervals{}",
            series.len(),
            if self.directions.is_some() { " with direction models" } else { "" }
        );
    }

    pub fn is_trained(&self) -> bool {
        self.total.is_trained()
    }

    pub fn has_direction_models(&self) -> bool {
        self.directions.is_some()
    }

    /// Raw forecast for the next `hours_ahead` hours on the sampling grid
    pub fn forecast(&self, hours_ahead: u32) -> Option<Vec<ForecastPoint>> {
        let last = self.total.last_observed()?;
        let config = self.normalizer.config();
        let steps = hours_ahead.saturating_mul(config.steps_per_hour());
        let grid = future_grid(last, steps, config.sample_interval_minutes);
        Some(self.total.predict_at(&grid))
    }

    /// Normalized prediction for `now + minutes_ahead`.
    ///
    /// The target is truncated to the minute. Returns `None` until trained,
    /// and when `now + minutes_ahead` falls outside the representable range.
    pub fn current_prediction(
        &self,
        now: NaiveDateTime,
        minutes_ahead: i64,
    ) -> Option<NormalizedPrediction> {
        let last = self.total.last_observed()?;
        let interval = self.normalizer.config().sample_interval_minutes;
        let Some(target) = Duration::try_minutes(minutes_ahead)
            .and_then(|lead| now.checked_add_signed(lead))
        else {
            log::debug!("Lead time of {} minutes is out of range", minutes_ahead);
            return None;
        };
        let target = floor_to_interval(target, 1);
        let grid = horizon_grid(last, target, interval);

        let total = self.total.predict_at(&grid);
        let prediction = match &self.directions {
            Some((first, second)) => self.normalizer.normalize_with_directions(
                total,
                (first.predict_at(&grid), second.predict_at(&grid)),
                target,
                minutes_ahead,
            ),
            None => self.normalizer.normalize(total, target, minutes_ahead),
        };

        if let Some(p) = &prediction {
            log::debug!(
                "Prediction for {}: {:.1} vehicles/min ({:.0}/hr)",
                target,
                p.mean_per_minute,
                p.vehicles_per_hour()
            );
        }
        prediction
    }

    /// Prediction using the configured default lead time
    pub fn current_prediction_default(&self, now: NaiveDateTime) -> Option<NormalizedPrediction> {
        self.current_prediction(now, self.normalizer.config().default_lead_minutes)
    }

    pub fn config(&self) -> &PredictionConfig {
        self.normalizer.config()
    }

    pub fn total_model(&self) -> &F {
        &self.total
    }

    pub fn direction_models(&self) -> Option<&(F, F)> {
        self.directions.as_ref()
    }

    /// When the models were last trained
    pub fn trained_at(&self) -> Option<NaiveDateTime> {
        self.trained_at
    }

    /// Source identifier of the training data
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }
}
