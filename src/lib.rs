//! # EcoFlow - Smart intersection decision engine
//!
//! Decides, per intersection, whether a traffic light should run its normal
//! cycle, extend green to clear heavy traffic, or push drivers onto a detour
//! because the air is unsafe.
//!
//! ## Key Features
//!
//! - **Health classification**: PM10 readings mapped to five severity tiers
//! - **Forecast normalization**: raw interval forecasts turned into clamped
//!   per-minute rates
//! - **Intersection policy**: NORMAL / MAX_FLOW / REROUTE state machine with
//!   decision history
//! - **Network registry**: many intersections keyed by name
//!
//! ## Quick Start
//!
//! ```rust
//! use ecoflow::{IntersectionPolicy, Mode, PolicyConfig};
//!
//! let mut policy = IntersectionPolicy::new("Test", 120.0, PolicyConfig::default());
//!
//! let decision = policy.decide(150.0, 25.0);
//! assert_eq!(decision.mode, Mode::MaxFlow);
//! assert_eq!(decision.green_light_seconds, 60);
//!
//! let decision = policy.decide(80.0, 65.0);
//! assert_eq!(decision.mode, Mode::Reroute);
//! assert_eq!(policy.history().len(), 2);
//! ```
//!
//! ## Modules
//!
//! - [`health`]: PM10 health impact tiers
//! - [`forecast`]: Forecaster trait, nearest-point and grid helpers
//! - [`normalizer`]: Forecast to per-minute rate conversion
//! - [`policy`]: Intersection decision state machine
//! - [`network`]: Registry of intersections
//! - [`series`]: Sensor records and interval bucketing
//! - [`stats`]: Historical traffic statistics
//! - [`profile`]: Seasonal slot-profile forecaster
//! - [`predictor`]: Trained forecasters answering lead-time queries
//! - [`artifact`]: Saving and loading trained models

// Modules
pub mod artifact;
pub mod config;
pub mod error;
pub mod forecast;
pub mod health;
pub mod network;
pub mod normalizer;
pub mod policy;
pub mod predictor;
pub mod profile;
pub mod series;
pub mod stats;

// Re-exports for convenient access
pub use artifact::{ModelArtifact, ModelMetadata};
pub use config::{AirQualityConfig, EcoflowConfig, PolicyConfig, PredictionConfig};
pub use error::{ArtifactError, ConfigError, EcoflowError, Result};
pub use forecast::{horizon_grid, nearest_point, ForecastPoint, Forecaster, Observation};
pub use health::{classify, HealthImpact, HealthLevel};
pub use network::IntersectionNetwork;
pub use normalizer::{
    normalize, normalize_with_directions, DirectionPrediction, NormalizedPrediction,
    PredictionNormalizer,
};
pub use policy::{
    describe_action, AirStatus, DecisionRecord, IntersectionDecision, IntersectionPolicy, Mode,
    TrafficStatus,
};
pub use predictor::TrafficPredictor;
pub use profile::SeasonalProfileForecaster;
pub use series::{aggregate_records, floor_to_interval, TrafficRecord, TrafficSeries};
pub use stats::{format_hours, TrafficStatistics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
