// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Forecaster seam
//!
//! The statistical model is a collaborator: anything that can be fitted on
//! `(timestamp, value)` observations and asked for point estimates with an
//! uncertainty band plugs in through [`Forecaster`]. This module also holds
//! the two grid helpers every forecaster caller needs: nearest-point lookup
//! and horizon construction.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A training sample: one value for one sampling interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Start of the interval
    pub timestamp: NaiveDateTime,
    /// Count for the interval
    pub value: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One model-produced estimate for a timestamp
///
/// Values are in the training unit (count per sampling interval).
/// `lower <= mean <= upper` is expected but not guaranteed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Time the estimate applies to
    pub timestamp: NaiveDateTime,
    /// Point estimate
    pub mean: f64,
    /// Lower uncertainty bound
    pub lower: f64,
    /// Upper uncertainty bound
    pub upper: f64,
}

impl ForecastPoint {
    /// Create a new forecast point
    pub fn new(timestamp: NaiveDateTime, mean: f64, lower: f64, upper: f64) -> Self {
        Self {
            timestamp,
            mean,
            lower,
            upper,
        }
    }

    /// Absolute distance to `target` in milliseconds
    pub fn distance_ms(&self, target: NaiveDateTime) -> i64 {
        self.timestamp
            .signed_duration_since(target)
            .num_milliseconds()
            .abs()
    }
}

/// A time-series forecaster
pub trait Forecaster {
    /// Fit on an ordered series. An empty series leaves the model untrained.
    fn fit(&mut self, series: &[Observation]);

    /// Predict at each target timestamp.
    ///
    /// An untrained model returns an empty vector.
    fn predict_at(&self, targets: &[NaiveDateTime]) -> Vec<ForecastPoint>;

    /// Whether `fit` has seen data
    fn is_trained(&self) -> bool;

    /// Timestamp of the last training observation
    fn last_observed(&self) -> Option<NaiveDateTime>;
}

/// Select the point closest to `target`.
///
/// Ties go to the earliest timestamp. Returns `None` for an empty sequence.
pub fn nearest_point<I>(points: I, target: NaiveDateTime) -> Option<ForecastPoint>
where
    I: IntoIterator,
    I::Item: Borrow<ForecastPoint>,
{
    let mut best: Option<(i64, ForecastPoint)> = None;

    for item in points {
        let point = *item.borrow();
        let distance = point.distance_ms(target);
        let better = match &best {
            None => true,
            Some((best_distance, best_point)) => {
                distance < *best_distance
                    || (distance == *best_distance && point.timestamp < best_point.timestamp)
            }
        };
        if better {
            best = Some((distance, point));
        }
    }

    best.map(|(_, point)| point)
}

/// Grid timestamps needed to cover `target`, stepping from `last_observed`.
///
/// The grid keeps the alignment of the training data. It holds the two grid
/// points that bracket `target` plus the first step after `last_observed`,
/// so its size does not grow with the distance to `target`. Points that
/// would fall outside the representable time range are left out.
pub fn horizon_grid(
    last_observed: NaiveDateTime,
    target: NaiveDateTime,
    interval_minutes: u32,
) -> Vec<NaiveDateTime> {
    let interval = i64::from(interval_minutes.max(1));
    let offset_minutes = target.signed_duration_since(last_observed).num_minutes();
    let floor_steps = offset_minutes.div_euclid(interval);

    let mut steps = vec![floor_steps, floor_steps.saturating_add(1), 1];
    steps.sort_unstable();
    steps.dedup();

    steps
        .into_iter()
        .filter_map(|step| grid_point(last_observed, step, interval))
        .collect()
}

/// The next `steps` grid timestamps after `last_observed`.
pub fn future_grid(
    last_observed: NaiveDateTime,
    steps: u32,
    interval_minutes: u32,
) -> Vec<NaiveDateTime> {
    let interval = i64::from(interval_minutes.max(1));
    (1..=i64::from(steps))
        .map_while(|step| grid_point(last_observed, step, interval))
        .collect()
}

fn grid_point(origin: NaiveDateTime, step: i64, interval: i64) -> Option<NaiveDateTime> {
    let offset = Duration::try_minutes(step.checked_mul(interval)?)?;
    origin.checked_add_signed(offset)
}
