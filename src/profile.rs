// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Seasonal profile forecaster
//!
//! The reference [`Forecaster`]: one slot per (weekday, time of day) on the
//! sampling grid. Each slot keeps the mean and sample standard deviation of
//! the training values that fell into it. Predictions are
//! `mean ± z·std` with `z` giving an 80% interval.
//!
//! Slots never seen in training fall back to the global statistics.

use crate::forecast::{ForecastPoint, Forecaster, Observation};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Two-sided 80% normal quantile
pub const INTERVAL_Z: f64 = 1.2816;

const DAYS_PER_WEEK: usize = 7;
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Summary statistics of one slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl SlotStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            var.sqrt()
        } else {
            0.0
        };
        Some(Self {
            mean,
            std_dev,
            count,
        })
    }
}

/// Weekly slot profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalProfileForecaster {
    /// Slot width (minutes)
    interval_minutes: u32,
    /// Multiplier on the standard deviation for the band
    interval_z: f64,
    /// `7 * slots_per_day` entries, Monday first
    slots: Vec<Option<SlotStats>>,
    global: Option<SlotStats>,
    last_observed: Option<NaiveDateTime>,
}

impl Default for SeasonalProfileForecaster {
    fn default() -> Self {
        Self::new(15)
    }
}

impl SeasonalProfileForecaster {
    /// Create an untrained forecaster with `interval_minutes` slots
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval_minutes: interval_minutes.clamp(1, MINUTES_PER_DAY),
            interval_z: INTERVAL_Z,
            slots: Vec::new(),
            global: None,
            last_observed: None,
        }
    }

    /// Override the band width multiplier
    pub fn with_interval_z(mut self, z: f64) -> Self {
        self.interval_z = z;
        self
    }

    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    fn slots_per_day(&self) -> usize {
        MINUTES_PER_DAY.div_ceil(self.interval_minutes) as usize
    }

    fn slot_index(&self, timestamp: NaiveDateTime) -> usize {
        let day = timestamp.weekday().num_days_from_monday() as usize;
        let minute = timestamp.num_seconds_from_midnight() / 60;
        day * self.slots_per_day() + (minute / self.interval_minutes) as usize
    }

    /// Statistics for the slot containing `timestamp`, if trained
    pub fn slot_stats(&self, timestamp: NaiveDateTime) -> Option<&SlotStats> {
        self.slots.get(self.slot_index(timestamp))?.as_ref()
    }

    /// Statistics over all training values
    pub fn global_stats(&self) -> Option<&SlotStats> {
        self.global.as_ref()
    }

    /// Number of slots that saw training data
    pub fn trained_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl Forecaster for SeasonalProfileForecaster {
    fn fit(&mut self, series: &[Observation]) {
        let slot_count = DAYS_PER_WEEK * self.slots_per_day();
        let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); slot_count];
        let mut all = Vec::with_capacity(series.len());

        for obs in series {
            if !obs.value.is_finite() {
                continue;
            }
            buckets[self.slot_index(obs.timestamp)].push(obs.value);
            all.push(obs.value);
        }

        self.global = SlotStats::from_values(&all);
        if self.global.is_none() {
            self.slots.clear();
            self.last_observed = None;
            return;
        }

        self.slots = buckets.iter().map(|v| SlotStats::from_values(v)).collect();
        self.last_observed = series.iter().map(|o| o.timestamp).max();

        log::debug!(
            "Profile fitted on {} observations, {} of {} slots populated",
            all.len(),
            self.trained_slots(),
            slot_count
        );
    }

    fn predict_at(&self, targets: &[NaiveDateTime]) -> Vec<ForecastPoint> {
        let Some(global) = self.global else {
            return Vec::new();
        };

        targets
            .iter()
            .map(|&timestamp| {
                let stats = self.slot_stats(timestamp).copied().unwrap_or(global);
                let half_width = self.interval_z * stats.std_dev;
                ForecastPoint::new(
                    timestamp,
                    stats.mean,
                    stats.mean - half_width,
                    stats.mean + half_width,
                )
            })
            .collect()
    }

    fn is_trained(&self) -> bool {
        self.global.is_some()
    }

    fn last_observed(&self) -> Option<NaiveDateTime> {
        self.last_observed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn monday(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_untrained_predicts_nothing() {
        let model = SeasonalProfileForecaster::new(15);
        assert!(!model.is_trained());
        assert!(model.predict_at(&[monday(8, 0)]).is_empty());
        assert!(model.last_observed().is_none());
    }

    #[test]
    fn test_slot_mean_and_band() {
        let mut model = SeasonalProfileForecaster::new(15);
        // Same slot on two consecutive Mondays
        let series = vec![
            Observation::new(monday(8, 0), 100.0),
            Observation::new(monday(8, 0) + Duration::weeks(1), 120.0),
        ];
        model.fit(&series);

        let point = model.predict_at(&[monday(8, 0) + Duration::weeks(2)])[0];
        assert_relative_eq!(point.mean, 110.0);
        let std = (200.0f64).sqrt();
        assert_relative_eq!(point.upper - point.mean, INTERVAL_Z * std, epsilon = 1e-9);
        assert_relative_eq!(point.mean - point.lower, INTERVAL_Z * std, epsilon = 1e-9);
        assert_eq!(model.last_observed(), Some(monday(8, 0) + Duration::weeks(1)));
    }

    #[test]
    fn test_unseen_slot_uses_global() {
        let mut model = SeasonalProfileForecaster::new(15);
        model.fit(&[
            Observation::new(monday(8, 0), 10.0),
            Observation::new(monday(9, 0), 30.0),
        ]);
        let point = model.predict_at(&[monday(3, 0)])[0];
        assert_relative_eq!(point.mean, 20.0);
        assert!(model.global_stats().is_some());
    }

    #[test]
    fn test_within_slot_timestamps_share_stats() {
        let mut model = SeasonalProfileForecaster::new(15);
        model.fit(&[Observation::new(monday(8, 0), 42.0)]);
        let points = model.predict_at(&[monday(8, 7), monday(8, 14)]);
        assert_eq!(points[0].mean, 42.0);
        assert_eq!(points[1].mean, 42.0);
        assert_eq!(points[0].lower, points[0].upper);
    }

    #[test]
    fn test_refit_on_empty_resets() {
        let mut model = SeasonalProfileForecaster::new(15);
        model.fit(&[Observation::new(monday(8, 0), 42.0)]);
        assert!(model.is_trained());
        model.fit(&[]);
        assert!(!model.is_trained());
        assert_eq!(model.trained_slots(), 0);
    }

    #[test]
    fn test_serde_preserves_predictions() {
        let mut model = SeasonalProfileForecaster::new(30);
        model.fit(&[
            Observation::new(monday(8, 0), 10.0),
            Observation::new(monday(8, 30), 14.0),
        ]);
        let json = serde_json::to_string(&model).unwrap();
        let restored: SeasonalProfileForecaster = serde_json::from_str(&json).unwrap();
        let target = [monday(8, 10) + Duration::weeks(1)];
        assert_eq!(model.predict_at(&target), restored.predict_at(&target));
    }
}
