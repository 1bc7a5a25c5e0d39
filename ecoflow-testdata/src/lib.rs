// EcoFlow Testdata - Synthetic history generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # EcoFlow Testdata
//!
//! Synthetic traffic and air quality histories for EcoFlow.
//!
//! - **Daily shapes**: commuter double peak, evening PM10 build-up
//! - **Generator**: seeded per-minute two-direction counts plus PM10
//! - **Datasets**: CSV/JSON in the sensor export layout
//! - **Scenarios**: reference decision cases with expected modes
//! - **Demo predictions**: time-of-day predictions when no model is trained
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ecoflow_testdata::{generate_dataset, GeneratorConfig};
//!
//! // Two weeks of minute data
//! let config = GeneratorConfig::new()
//!     .with_sample_interval_secs(60)
//!     .with_duration_days(14.0)
//!     .with_seed(42);
//!
//! let dataset = generate_dataset(&config);
//! dataset.to_csv("history.csv").unwrap();
//! ```

pub mod dataset;
pub mod demo;
pub mod generator;
pub mod scenario;
pub mod shapes;

// Re-exports for convenience
pub use dataset::{Dataset, DatasetError, DatasetMetadata, DatasetRow};
pub use demo::simulate_prediction;
pub use generator::{generate_dataset, GeneratorConfig};
pub use scenario::{reference_scenarios, run_all, DecisionScenario, ScenarioOutcome};
pub use shapes::DailyShape;
