// EcoFlow Testdata - Simulated predictions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Time-of-day predictions for running a dashboard without a trained model.

use chrono::{NaiveDateTime, Timelike};
use ecoflow::NormalizedPrediction;
use rand::Rng;

/// Half-width of the simulated uncertainty band (vehicles per hour).
pub const BAND_HALF_WIDTH: f64 = 20.0;

/// Base level and spread for an hour of day, in vehicles per hour.
pub fn hourly_profile(hour: u32) -> (f64, f64) {
    match hour {
        7..=9 | 17..=19 => (150.0, 30.0),
        10..=16 => (80.0, 20.0),
        _ => (30.0, 10.0),
    }
}

/// Simulated prediction for `now`, expressed like a real normalized one.
pub fn simulate_prediction(
    now: NaiveDateTime,
    lead_minutes: i64,
    rng: &mut (impl Rng + ?Sized),
) -> NormalizedPrediction {
    let (base, variation) = hourly_profile(now.hour());
    let per_hour = (base + rng.gen_range(-variation..variation)).max(0.0);
    let lower = (per_hour - BAND_HALF_WIDTH).max(0.0);
    let upper = per_hour + BAND_HALF_WIDTH;

    NormalizedPrediction {
        timestamp: now,
        mean_per_minute: per_hour / 60.0,
        lower_per_minute: lower / 60.0,
        upper_per_minute: upper / 60.0,
        mean_per_interval: per_hour / 4.0,
        target_lead_minutes: lead_minutes,
        direction1: None,
        direction2: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_rush_hour_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let p = simulate_prediction(at(8), 15, &mut rng);
            let per_hour = p.vehicles_per_hour();
            assert!((120.0 - 1e-9..180.0).contains(&per_hour));
            assert!(p.confidence_range() <= 40.0 / 60.0 + 1e-9);
        }
    }

    #[test]
    fn test_night_is_quiet() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let p = simulate_prediction(at(3), 15, &mut rng);
            assert!(p.vehicles_per_hour() < 40.0 + 1e-9);
            assert!(p.lower_per_minute >= 0.0);
        }
    }

    #[test]
    fn test_profile_boundaries() {
        assert_eq!(hourly_profile(7).0, 150.0);
        assert_eq!(hourly_profile(19).0, 150.0);
        assert_eq!(hourly_profile(10).0, 80.0);
        assert_eq!(hourly_profile(20).0, 30.0);
    }
}
