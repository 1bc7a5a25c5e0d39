// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! EcoFlow configuration.
//!
//! Thresholds and timings are plain values handed to constructors, so two
//! policies in the same process can run with different settings.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Master configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcoflowConfig {
    /// Intersection policy thresholds and light timings.
    pub policy: PolicyConfig,

    /// Forecast normalization settings.
    pub prediction: PredictionConfig,

    /// Air quality reference limits.
    pub air_quality: AirQualityConfig,
}

impl EcoflowConfig {
    /// Parse a configuration from JSON. Missing sections keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Check structural consistency.
    ///
    /// Only settings that would make arithmetic meaningless are rejected.
    /// Thresholds themselves are accepted as given.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.policy.validate()?;
        self.prediction.validate()
    }
}

/// Intersection policy configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Capacity (cars/hour) used when an intersection is added without one.
    pub default_capacity_threshold: f64,

    /// Green phase under normal conditions (seconds).
    pub standard_green_secs: u32,

    /// Green phase when predicted volume exceeds capacity (seconds).
    pub extended_green_secs: u32,

    /// PM10 concentration (µg/m³) above which traffic is rerouted.
    pub emergency_pm10_threshold: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_capacity_threshold: 120.0,
            standard_green_secs: 30,
            extended_green_secs: 60,
            emergency_pm10_threshold: 50.0,
        }
    }
}

impl PolicyConfig {
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.extended_green_secs < self.standard_green_secs {
            return Err(ConfigError::GreenDurationOrder {
                standard: self.standard_green_secs,
                extended: self.extended_green_secs,
            });
        }
        Ok(())
    }
}

/// Forecast normalization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Bucket width the forecaster was trained on (minutes).
    pub sample_interval_minutes: u32,

    /// Plausibility ceiling for one interval total (vehicles per interval).
    ///
    /// 1125 per 15 minutes is 75 vehicles/minute.
    pub max_rate_per_interval: f64,

    /// Lead time used when a caller does not ask for one (minutes).
    pub default_lead_minutes: i64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            sample_interval_minutes: 15,
            max_rate_per_interval: 1125.0,
            default_lead_minutes: 15,
        }
    }
}

impl PredictionConfig {
    /// Interval ceiling expressed per minute.
    pub fn max_rate_per_minute(&self) -> f64 {
        self.max_rate_per_interval / self.sample_interval_minutes as f64
    }

    /// Forecast steps per hour on the sampling grid.
    pub fn steps_per_hour(&self) -> u32 {
        (60 / self.sample_interval_minutes.max(1)).max(1)
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.sample_interval_minutes == 0 {
            return Err(ConfigError::InvalidSampleInterval {
                minutes: self.sample_interval_minutes,
            });
        }
        if !self.max_rate_per_interval.is_finite() || self.max_rate_per_interval <= 0.0 {
            return Err(ConfigError::InvalidRateCeiling {
                value: self.max_rate_per_interval,
            });
        }
        Ok(())
    }
}

/// Air quality reference limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirQualityConfig {
    /// WHO 24-hour mean guideline for PM10 (µg/m³).
    pub who_pm10_limit: f64,
}

impl Default for AirQualityConfig {
    fn default() -> Self {
        Self {
            who_pm10_limit: 45.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcoflowError;

    #[test]
    fn test_default_config() {
        let config = EcoflowConfig::default();
        assert_eq!(config.policy.standard_green_secs, 30);
        assert_eq!(config.policy.extended_green_secs, 60);
        assert_eq!(config.policy.emergency_pm10_threshold, 50.0);
        assert_eq!(config.prediction.sample_interval_minutes, 15);
        assert_eq!(config.prediction.max_rate_per_interval, 1125.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_rate_per_minute() {
        let config = PredictionConfig::default();
        assert_eq!(config.max_rate_per_minute(), 75.0);
        assert_eq!(config.steps_per_hour(), 4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EcoflowConfig::from_json_str(r#"{"policy": {"extended_green_secs": 90}}"#)
            .unwrap();
        assert_eq!(config.policy.extended_green_secs, 90);
        assert_eq!(config.policy.standard_green_secs, 30);
        assert_eq!(config.prediction, PredictionConfig::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = EcoflowConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = EcoflowConfig::from_json_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = EcoflowConfig::from_json_str(r#"{"prediction": {"sample_interval_minutes": 0}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            EcoflowError::Config(ConfigError::InvalidSampleInterval { minutes: 0 })
        ));
    }

    #[test]
    fn test_rejects_inverted_green_durations() {
        let config = PolicyConfig {
            standard_green_secs: 45,
            extended_green_secs: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let err = EcoflowConfig::from_json_file("/nonexistent/ecoflow.json").unwrap_err();
        assert!(matches!(
            err,
            EcoflowError::Config(ConfigError::Unreadable { .. })
        ));
    }
}
