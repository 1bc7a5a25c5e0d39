//! Health impact of particulate matter
//!
//! Maps a PM10 concentration to a WHO-inspired severity tier.

use serde::{Deserialize, Serialize};

/// Health impact tier, in increasing severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthLevel {
    /// PM10 <= 20
    Excellent,
    /// PM10 <= 40
    Good,
    /// PM10 <= 50
    Moderate,
    /// PM10 <= 100
    Unhealthy,
    /// PM10 > 100
    Hazardous,
}

impl HealthLevel {
    /// Severity rank, 0 (Excellent) to 4 (Hazardous)
    pub fn rank(&self) -> u8 {
        match self {
            Self::Excellent => 0,
            Self::Good => 1,
            Self::Moderate => 2,
            Self::Unhealthy => 3,
            Self::Hazardous => 4,
        }
    }

    /// Display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::Unhealthy => "Unhealthy",
            Self::Hazardous => "Hazardous",
        }
    }

    /// Advice shown next to the tier
    pub fn message(&self) -> &'static str {
        match self {
            Self::Excellent => "Air quality is excellent. Ideal for outdoor activities.",
            Self::Good => "Air quality is good. Safe for all activities.",
            Self::Moderate => "Air quality is acceptable for most people.",
            Self::Unhealthy => "Sensitive groups should limit outdoor activities.",
            Self::Hazardous => "Health warning! Everyone should avoid outdoor activities.",
        }
    }

    /// Display colour (hex)
    pub fn color(&self) -> &'static str {
        match self {
            Self::Excellent => "#00C853",
            Self::Good => "#64DD17",
            Self::Moderate => "#FFD600",
            Self::Unhealthy => "#FF6D00",
            Self::Hazardous => "#DD2C00",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification result for a PM10 reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthImpact {
    /// Tier
    pub level: HealthLevel,
    /// Same as `level.rank()`
    pub severity_rank: u8,
    /// Advice text
    pub message: String,
    /// Display colour
    pub color: String,
    /// The reading that was classified
    pub pm10: f64,
}

impl HealthImpact {
    /// Whether the reading is above a guideline value (e.g. the WHO 24-hour mean)
    pub fn exceeds_guideline(&self, limit: f64) -> bool {
        self.pm10 > limit
    }
}

/// Classify a PM10 concentration (µg/m³).
///
/// Upper bounds are inclusive. Any real number is accepted; negative
/// readings fall into `Excellent`.
pub fn classify(pm10: f64) -> HealthImpact {
    let level = if pm10 <= 20.0 {
        HealthLevel::Excellent
    } else if pm10 <= 40.0 {
        HealthLevel::Good
    } else if pm10 <= 50.0 {
        HealthLevel::Moderate
    } else if pm10 <= 100.0 {
        HealthLevel::Unhealthy
    } else {
        HealthLevel::Hazardous
    };

    HealthImpact {
        level,
        severity_rank: level.rank(),
        message: level.message().to_string(),
        color: level.color().to_string(),
        pm10,
    }
}
