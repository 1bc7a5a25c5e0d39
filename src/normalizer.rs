// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prediction normalization
//!
//! Turns raw forecaster output (counts per sampling interval) into a
//! decision-ready per-minute rate:
//!
//! 1. pick the forecast point nearest the requested target time,
//! 2. clamp each interval value to `[0, max_rate_per_interval]`,
//! 3. divide by the interval width.
//!
//! Clamping happens before division, so no exported per-minute figure
//! implies an interval total above the ceiling. Lower and upper bounds are
//! clamped independently and may cross; the pair is for display only.

use crate::config::PredictionConfig;
use crate::forecast::{nearest_point, ForecastPoint};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::iter::Empty;

/// Per-direction part of a prediction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionPrediction {
    /// Forecast point that was selected
    pub timestamp: NaiveDateTime,
    /// Clamped mean, vehicles per minute
    pub mean_per_minute: f64,
    /// Clamped lower bound, vehicles per minute
    pub lower_per_minute: f64,
    /// Clamped upper bound, vehicles per minute
    pub upper_per_minute: f64,
    /// Clamped mean, vehicles per sampling interval
    pub mean_per_interval: f64,
    /// Requested lead time, echoed back
    pub target_lead_minutes: i64,
}

impl DirectionPrediction {
    /// Mean as vehicles per hour
    pub fn vehicles_per_hour(&self) -> f64 {
        self.mean_per_minute * 60.0
    }
}

/// Normalized, bounded prediction
///
/// `timestamp` is the forecaster's grid point nearest the target, so it need
/// not be exactly `now + target_lead_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPrediction {
    /// Forecast point that was selected
    pub timestamp: NaiveDateTime,
    /// Clamped mean, vehicles per minute
    pub mean_per_minute: f64,
    /// Clamped lower bound, vehicles per minute
    pub lower_per_minute: f64,
    /// Clamped upper bound, vehicles per minute
    pub upper_per_minute: f64,
    /// Clamped mean, vehicles per sampling interval
    pub mean_per_interval: f64,
    /// Requested lead time, echoed back
    pub target_lead_minutes: i64,
    /// First direction, when per-direction forecasts were supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction1: Option<DirectionPrediction>,
    /// Second direction, when per-direction forecasts were supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction2: Option<DirectionPrediction>,
}

impl NormalizedPrediction {
    /// Mean as vehicles per hour (the unit intersection capacity uses)
    pub fn vehicles_per_hour(&self) -> f64 {
        self.mean_per_minute * 60.0
    }

    /// Width of the band in vehicles per minute.
    ///
    /// Negative when the independently clamped bounds crossed.
    pub fn confidence_range(&self) -> f64 {
        self.upper_per_minute - self.lower_per_minute
    }

    /// Whether per-direction figures are attached
    pub fn has_directions(&self) -> bool {
        self.direction1.is_some() && self.direction2.is_some()
    }
}

/// Clamped per-interval figures for one point
struct IntervalRates {
    mean: f64,
    lower: f64,
    upper: f64,
}

fn clamp_interval(value: f64, max_rate_per_interval: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.min(max_rate_per_interval).max(0.0)
}

fn clamp_point(point: &ForecastPoint, max_rate_per_interval: f64) -> IntervalRates {
    if point.mean > max_rate_per_interval {
        log::warn!(
            "Prediction {:.1} vehicles/interval capped at {:.1}",
            point.mean,
            max_rate_per_interval
        );
    }
    IntervalRates {
        mean: clamp_interval(point.mean, max_rate_per_interval),
        lower: clamp_interval(point.lower, max_rate_per_interval),
        upper: clamp_interval(point.upper, max_rate_per_interval),
    }
}

fn select_direction<I>(
    series: I,
    target: NaiveDateTime,
    lead_minutes: i64,
    interval: f64,
    max_rate_per_interval: f64,
) -> Option<DirectionPrediction>
where
    I: IntoIterator,
    I::Item: Borrow<ForecastPoint>,
{
    let point = nearest_point(series, target)?;
    let rates = clamp_point(&point, max_rate_per_interval);
    Some(DirectionPrediction {
        timestamp: point.timestamp,
        mean_per_minute: rates.mean / interval,
        lower_per_minute: rates.lower / interval,
        upper_per_minute: rates.upper / interval,
        mean_per_interval: rates.mean,
        target_lead_minutes: lead_minutes,
    })
}

/// Normalize a forecast series for `target`.
///
/// Returns `None` when the series is empty (nothing trained yet, empty
/// horizon). Out-of-range inputs are clamped, never rejected.
pub fn normalize<I>(
    series: I,
    target: NaiveDateTime,
    lead_minutes: i64,
    sample_interval_minutes: u32,
    max_rate_per_interval: f64,
) -> Option<NormalizedPrediction>
where
    I: IntoIterator,
    I::Item: Borrow<ForecastPoint>,
{
    normalize_with_directions(
        series,
        None::<(Empty<ForecastPoint>, Empty<ForecastPoint>)>,
        target,
        lead_minutes,
        sample_interval_minutes,
        max_rate_per_interval,
    )
}

/// Normalize a forecast series and, when given, both direction forecasts.
///
/// Directions are attached only when both direction series yield a point;
/// otherwise the total is returned alone. No consistency check between the
/// directions and the total is made.
pub fn normalize_with_directions<I, A, B>(
    series: I,
    directions: Option<(A, B)>,
    target: NaiveDateTime,
    lead_minutes: i64,
    sample_interval_minutes: u32,
    max_rate_per_interval: f64,
) -> Option<NormalizedPrediction>
where
    I: IntoIterator,
    I::Item: Borrow<ForecastPoint>,
    A: IntoIterator,
    A::Item: Borrow<ForecastPoint>,
    B: IntoIterator,
    B::Item: Borrow<ForecastPoint>,
{
    let interval = f64::from(sample_interval_minutes.max(1));
    let total = select_direction(series, target, lead_minutes, interval, max_rate_per_interval)?;

    let mut prediction = NormalizedPrediction {
        timestamp: total.timestamp,
        mean_per_minute: total.mean_per_minute,
        lower_per_minute: total.lower_per_minute,
        upper_per_minute: total.upper_per_minute,
        mean_per_interval: total.mean_per_interval,
        target_lead_minutes: lead_minutes,
        direction1: None,
        direction2: None,
    };

    if let Some((first, second)) = directions {
        let first = select_direction(first, target, lead_minutes, interval, max_rate_per_interval);
        let second = select_direction(second, target, lead_minutes, interval, max_rate_per_interval);
        if let (Some(first), Some(second)) = (first, second) {
            prediction.direction1 = Some(first);
            prediction.direction2 = Some(second);
        } else {
            log::debug!("Direction forecasts incomplete, returning total only");
        }
    }

    Some(prediction)
}

/// Normalizer bound to a [`PredictionConfig`]
#[derive(Debug, Clone, Default)]
pub struct PredictionNormalizer {
    config: PredictionConfig,
}

impl PredictionNormalizer {
    /// Create a normalizer
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    /// Normalize the total series only
    pub fn normalize<I>(
        &self,
        series: I,
        target: NaiveDateTime,
        lead_minutes: i64,
    ) -> Option<NormalizedPrediction>
    where
        I: IntoIterator,
        I::Item: Borrow<ForecastPoint>,
    {
        normalize(
            series,
            target,
            lead_minutes,
            self.config.sample_interval_minutes,
            self.config.max_rate_per_interval,
        )
    }

    /// Normalize the total series and attach both direction sub-forecasts.
    ///
    /// See [`normalize_with_directions`].
    pub fn normalize_with_directions<I, A, B>(
        &self,
        series: I,
        directions: (A, B),
        target: NaiveDateTime,
        lead_minutes: i64,
    ) -> Option<NormalizedPrediction>
    where
        I: IntoIterator,
        I::Item: Borrow<ForecastPoint>,
        A: IntoIterator,
        A::Item: Borrow<ForecastPoint>,
        B: IntoIterator,
        B::Item: Borrow<ForecastPoint>,
    {
        normalize_with_directions(
            series,
            Some(directions),
            target,
            lead_minutes,
            self.config.sample_interval_minutes,
            self.config.max_rate_per_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn point(offset_minutes: i64, mean: f64, lower: f64, upper: f64) -> ForecastPoint {
        ForecastPoint::new(now() + Duration::minutes(offset_minutes), mean, lower, upper)
    }

    fn normalizer() -> PredictionNormalizer {
        PredictionNormalizer::new(PredictionConfig::default())
    }

    #[test]
    fn test_clamps_to_ceiling_before_rescale() {
        let series = vec![point(15, 2000.0, 1500.0, 2500.0)];
        let prediction = normalizer()
            .normalize(&series, now() + Duration::minutes(15), 15)
            .unwrap();
        assert_relative_eq!(prediction.mean_per_minute, 75.0);
        assert_relative_eq!(prediction.upper_per_minute, 75.0);
        assert_relative_eq!(prediction.mean_per_interval, 1125.0);
    }

    #[test]
    fn test_clamps_negative_to_zero() {
        let series = vec![point(15, -50.0, -80.0, 10.0)];
        let prediction = normalizer()
            .normalize(&series, now() + Duration::minutes(15), 15)
            .unwrap();
        assert_eq!(prediction.mean_per_minute, 0.0);
        assert_eq!(prediction.lower_per_minute, 0.0);
        assert_relative_eq!(prediction.upper_per_minute, 10.0 / 15.0);
    }

    #[test]
    fn test_rescales_to_per_minute() {
        let series = vec![point(15, 300.0, 240.0, 360.0)];
        let prediction = normalizer()
            .normalize(&series, now() + Duration::minutes(15), 15)
            .unwrap();
        assert_relative_eq!(prediction.mean_per_minute, 20.0);
        assert_relative_eq!(prediction.lower_per_minute, 16.0);
        assert_relative_eq!(prediction.upper_per_minute, 24.0);
        assert_relative_eq!(prediction.vehicles_per_hour(), 1200.0);
        assert_relative_eq!(prediction.confidence_range(), 8.0);
    }

    #[test]
    fn test_selects_nearest_point_and_echoes_lead() {
        let series = vec![
            point(0, 150.0, 0.0, 0.0),
            point(15, 300.0, 0.0, 0.0),
            point(30, 450.0, 0.0, 0.0),
        ];
        let prediction = normalizer()
            .normalize(&series, now() + Duration::minutes(20), 20)
            .unwrap();
        assert_eq!(prediction.timestamp, now() + Duration::minutes(15));
        assert_eq!(prediction.target_lead_minutes, 20);
        assert_relative_eq!(prediction.mean_per_minute, 20.0);
    }

    #[test]
    fn test_empty_series_is_absent() {
        let series: Vec<ForecastPoint> = Vec::new();
        assert!(normalizer().normalize(&series, now(), 15).is_none());
    }

    #[test]
    fn test_crossed_bounds_are_preserved() {
        // Lower above the ceiling, upper below zero: both clamp independently
        let series = vec![point(15, 500.0, 1300.0, -20.0)];
        let prediction = normalizer()
            .normalize(&series, now() + Duration::minutes(15), 15)
            .unwrap();
        assert_relative_eq!(prediction.lower_per_minute, 75.0);
        assert_eq!(prediction.upper_per_minute, 0.0);
        assert!(prediction.confidence_range() < 0.0);
    }

    #[test]
    fn test_directions_attached() {
        let total = vec![point(15, 300.0, 250.0, 350.0)];
        let dir_a = vec![point(15, 180.0, 150.0, 210.0)];
        let dir_b = vec![point(15, 2000.0, 100.0, 3000.0)];
        let prediction = normalizer()
            .normalize_with_directions(&total, (&dir_a, &dir_b), now() + Duration::minutes(15), 15)
            .unwrap();

        assert!(prediction.has_directions());
        let first = prediction.direction1.unwrap();
        let second = prediction.direction2.unwrap();
        assert_relative_eq!(first.mean_per_minute, 12.0);
        assert_relative_eq!(second.mean_per_minute, 75.0);
        assert_eq!(second.target_lead_minutes, 15);
    }

    #[test]
    fn test_missing_direction_returns_total_only() {
        let total = vec![point(15, 300.0, 250.0, 350.0)];
        let dir_a = vec![point(15, 180.0, 150.0, 210.0)];
        let dir_b: Vec<ForecastPoint> = Vec::new();
        let prediction = normalizer()
            .normalize_with_directions(&total, (&dir_a, &dir_b), now() + Duration::minutes(15), 15)
            .unwrap();

        assert!(!prediction.has_directions());
        assert!(prediction.direction1.is_none());
        assert_relative_eq!(prediction.mean_per_minute, 20.0);
    }

    #[test]
    fn test_free_function_matches_normalizer() {
        let series = vec![point(0, 90.0, 60.0, 120.0), point(15, 180.0, 120.0, 240.0)];
        let target = now() + Duration::minutes(10);
        let a = normalize(&series, target, 10, 15, 1125.0);
        let b = normalizer().normalize(&series, target, 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_free_function_fuses_directions() {
        let total = vec![point(0, 90.0, 60.0, 120.0), point(15, 180.0, 120.0, 240.0)];
        let dir_a = vec![point(0, 60.0, 40.0, 80.0), point(15, 120.0, 80.0, 160.0)];
        let dir_b = vec![point(0, 30.0, 20.0, 40.0), point(15, 60.0, 40.0, 80.0)];
        let target = now() + Duration::minutes(10);

        let fused = normalize_with_directions(&total, Some((&dir_a, &dir_b)), target, 10, 15, 1125.0)
            .unwrap();
        assert_eq!(
            Some(fused),
            normalizer().normalize_with_directions(&total, (&dir_a, &dir_b), target, 10)
        );
        assert_relative_eq!(fused.direction1.unwrap().mean_per_minute, 8.0);
        assert_relative_eq!(fused.direction2.unwrap().mean_per_minute, 4.0);

        let alone = normalize_with_directions(
            &total,
            None::<(&Vec<ForecastPoint>, &Vec<ForecastPoint>)>,
            target,
            10,
            15,
            1125.0,
        )
        .unwrap();
        assert!(!alone.has_directions());
        assert_eq!(Some(alone), normalize(&total, target, 10, 15, 1125.0));
    }
}
