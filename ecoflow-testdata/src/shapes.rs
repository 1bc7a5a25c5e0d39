// EcoFlow Testdata - Daily shapes
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Daily shapes for synthetic traffic and pollution.
//!
//! Shapes are evaluated at a wall-clock time; only the time of day
//! matters. Weekday/weekend differences are applied by the generator.

use chrono::{NaiveDateTime, Timelike};
use rand::Rng;
use rand_distr::{Distribution, LogNormal};
use serde::{Deserialize, Serialize};

/// How a quantity varies over one day.
///
/// `Sum` stacks shapes, e.g. a commuter curve on top of bursty arrivals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum DailyShape {
    /// Same level all day.
    Flat { level: f64 },

    /// One rise to `base + height` around `at_hour`.
    Peak {
        base: f64,
        height: f64,
        at_hour: f64,
        width_hours: f64,
    },

    /// Morning and evening rush, both reaching `base + height`.
    CommuterPeaks {
        base: f64,
        height: f64,
        morning_hour: f64,
        evening_hour: f64,
        width_hours: f64,
    },

    /// Log-normal draws (platoons released by upstream lights).
    Bursty { mu: f64, sigma: f64 },

    /// Sum of the inner shapes.
    Sum(Vec<DailyShape>),
}

/// Bell curve centered on `center`, measured on the 24-hour circle.
fn bell(hour: f64, center: f64, width: f64) -> f64 {
    let distance = (hour - center).rem_euclid(24.0);
    let distance = distance.min(24.0 - distance);
    let width = width.max(f64::EPSILON);
    (-0.5 * (distance / width).powi(2)).exp()
}

fn fractional_hour(timestamp: NaiveDateTime) -> f64 {
    f64::from(timestamp.num_seconds_from_midnight()) / 3600.0
}

impl DailyShape {
    /// Value at `timestamp`. Only `Bursty` consumes randomness.
    pub fn value_at(&self, timestamp: NaiveDateTime, rng: &mut (impl Rng + ?Sized)) -> f64 {
        let hour = fractional_hour(timestamp);
        match self {
            Self::Flat { level } => *level,
            Self::Peak {
                base,
                height,
                at_hour,
                width_hours,
            } => base + height * bell(hour, *at_hour, *width_hours),
            Self::CommuterPeaks {
                base,
                height,
                morning_hour,
                evening_hour,
                width_hours,
            } => {
                let rush = bell(hour, *morning_hour, *width_hours)
                    .max(bell(hour, *evening_hour, *width_hours));
                base + height * rush
            }
            Self::Bursty { mu, sigma } => LogNormal::new(*mu, *sigma)
                .map(|dist| dist.sample(rng))
                .unwrap_or_else(|_| mu.exp()),
            Self::Sum(parts) => parts.iter().map(|part| part.value_at(timestamp, rng)).sum(),
        }
    }

    /// Commuter traffic in vehicles per minute, rush at 08:00 and 17:30.
    pub fn commuter_traffic(off_peak: f64, rush: f64) -> Self {
        Self::CommuterPeaks {
            base: off_peak,
            height: rush - off_peak,
            morning_hour: 8.0,
            evening_hour: 17.5,
            width_hours: 1.5,
        }
    }

    /// PM10 in µg/m³: background plus an evening build-up peaking at 18:30.
    pub fn evening_pm10(background: f64, peak: f64) -> Self {
        Self::Peak {
            base: background,
            height: peak - background,
            at_hour: 18.5,
            width_hours: 2.5,
        }
    }
}
