// EcoFlow Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Core dataset generation logic.
//!
//! Produces a per-sample history of two-direction vehicle counts plus a PM10
//! reading, shaped by [`DailyShape`]s. Output is deterministic for a
//! given seed.

use crate::dataset::{Dataset, DatasetMetadata, DatasetRow};
use crate::shapes::DailyShape;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// First sample time.
    pub start: NaiveDateTime,
    /// Interval between samples in seconds.
    pub sample_interval_secs: u32,
    /// Number of samples to generate.
    pub num_samples: usize,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Sensor identifier written to every row.
    pub imei: String,
    /// Traffic shape in vehicles per minute (both directions).
    pub traffic: DailyShape,
    /// Share of traffic in direction 1 (0.0 - 1.0).
    pub direction_split: f64,
    /// Multiplier applied to traffic on Saturdays and Sundays.
    pub weekend_factor: f64,
    /// Standard deviation of traffic noise (vehicles per minute).
    pub traffic_noise_std: f64,
    /// PM10 shape (µg/m³).
    pub pm10: DailyShape,
    /// Standard deviation of PM10 noise.
    pub pm10_noise_std: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 2, 5)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            sample_interval_secs: 60,
            num_samples: 7 * 24 * 60, // 1 week
            seed: None,
            imei: "860000000000001".to_string(),
            traffic: DailyShape::commuter_traffic(0.3, 3.0),
            direction_split: 0.55,
            weekend_factor: 0.6,
            traffic_noise_std: 0.3,
            pm10: DailyShape::evening_pm10(18.0, 42.0),
            pm10_noise_std: 3.0,
        }
    }
}

impl GeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set start time.
    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = start;
        self
    }

    /// Set sample interval in seconds.
    pub fn with_sample_interval_secs(mut self, secs: u32) -> Self {
        self.sample_interval_secs = secs.max(1);
        self
    }

    /// Set number of samples.
    pub fn with_num_samples(mut self, n: usize) -> Self {
        self.num_samples = n;
        self
    }

    /// Set duration in days (calculates num_samples from interval).
    pub fn with_duration_days(mut self, days: f64) -> Self {
        let total_secs = days * 86_400.0;
        self.num_samples = (total_secs / f64::from(self.sample_interval_secs)).ceil() as usize;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set sensor identifier.
    pub fn with_imei(mut self, imei: &str) -> Self {
        self.imei = imei.to_string();
        self
    }

    /// Set the traffic shape.
    pub fn with_traffic(mut self, shape: DailyShape) -> Self {
        self.traffic = shape;
        self
    }

    /// Set the PM10 shape.
    pub fn with_pm10(mut self, shape: DailyShape) -> Self {
        self.pm10 = shape;
        self
    }

    /// Set weekend multiplier.
    pub fn with_weekend_factor(mut self, factor: f64) -> Self {
        self.weekend_factor = factor;
        self
    }

    /// Disable all noise.
    pub fn without_noise(mut self) -> Self {
        self.traffic_noise_std = 0.0;
        self.pm10_noise_std = 0.0;
        self
    }

    /// Timestamp of the last sample.
    pub fn end(&self) -> NaiveDateTime {
        let steps = self.num_samples.saturating_sub(1) as i64;
        self.start + Duration::seconds(steps * i64::from(self.sample_interval_secs))
    }
}

fn noise(rng: &mut StdRng, std: f64) -> f64 {
    match Normal::new(0.0, std) {
        Ok(dist) if std > 0.0 => dist.sample(rng),
        _ => 0.0,
    }
}

/// Generate a history dataset.
pub fn generate_dataset(config: &GeneratorConfig) -> Dataset {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let minutes_per_sample = f64::from(config.sample_interval_secs.max(1)) / 60.0;
    let split = config.direction_split.clamp(0.0, 1.0);

    let mut dataset = Dataset::new().with_metadata(DatasetMetadata {
        name: None,
        description: Some("Synthetic traffic and PM10 history".to_string()),
        seed: config.seed,
        sample_interval_secs: Some(config.sample_interval_secs),
    });

    for i in 0..config.num_samples {
        let timestamp =
            config.start + Duration::seconds(i as i64 * i64::from(config.sample_interval_secs));

        let weekend = matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun);
        let day_factor = if weekend { config.weekend_factor } else { 1.0 };

        let rate = config.traffic.value_at(timestamp, &mut rng) * day_factor
            + noise(&mut rng, config.traffic_noise_std);
        let vehicles = (rate * minutes_per_sample).max(0.0).round();
        let tr1 = (vehicles * split).round();
        let tr2 = vehicles - tr1;

        let pm10 = (config.pm10.value_at(timestamp, &mut rng)
            + noise(&mut rng, config.pm10_noise_std))
        .max(0.0);

        dataset.add_row(DatasetRow {
            timestamp,
            imei: config.imei.clone(),
            tr1,
            tr2,
            pm10: Some(pm10),
        });
    }

    dataset
}
