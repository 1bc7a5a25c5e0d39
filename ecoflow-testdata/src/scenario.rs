// EcoFlow Testdata - Decision scenarios
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Reference decision scenarios.
//!
//! Each scenario pairs an input (predicted traffic, PM10) with the mode an
//! intersection with the default capacity is expected to choose.

use ecoflow::{IntersectionPolicy, Mode, PolicyConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A decision scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionScenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Predicted traffic in vehicles per hour.
    pub predicted_traffic: f64,
    /// PM10 reading in µg/m³.
    pub pm10: f64,
    /// Mode the policy should select.
    pub expected_mode: Mode,
    /// Expected green phase, when the scenario pins it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_green_secs: Option<u32>,
}

/// Outcome of running a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub expected_mode: Mode,
    pub actual_mode: Mode,
    pub green_light_seconds: u32,
    pub passed: bool,
}

impl DecisionScenario {
    /// Run against a policy. The policy records the decision.
    pub fn run(&self, policy: &mut IntersectionPolicy) -> ScenarioOutcome {
        let decision = policy.decide(self.predicted_traffic, self.pm10);
        let green_ok = self
            .expected_green_secs
            .map_or(true, |g| g == decision.green_light_seconds);

        ScenarioOutcome {
            name: self.name.clone(),
            expected_mode: self.expected_mode,
            actual_mode: decision.mode,
            green_light_seconds: decision.green_light_seconds,
            passed: decision.mode == self.expected_mode && green_ok,
        }
    }

    /// Load scenarios from a JSON array file.
    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<Self>, crate::DatasetError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// The three reference situations: normal day, rush hour, toxic air.
pub fn reference_scenarios() -> Vec<DecisionScenario> {
    vec![
        DecisionScenario {
            name: "normal".to_string(),
            description: "Light traffic, clean air".to_string(),
            predicted_traffic: 50.0,
            pm10: 20.0,
            expected_mode: Mode::Normal,
            expected_green_secs: Some(30),
        },
        DecisionScenario {
            name: "rush_hour".to_string(),
            description: "Traffic above capacity, acceptable air".to_string(),
            predicted_traffic: 150.0,
            pm10: 25.0,
            expected_mode: Mode::MaxFlow,
            expected_green_secs: Some(60),
        },
        DecisionScenario {
            name: "toxic_air".to_string(),
            description: "Moderate traffic, PM10 above the emergency threshold".to_string(),
            predicted_traffic: 80.0,
            pm10: 65.0,
            expected_mode: Mode::Reroute,
            expected_green_secs: Some(30),
        },
    ]
}

/// Run scenarios on a fresh default-capacity policy each.
pub fn run_all(scenarios: &[DecisionScenario], config: &PolicyConfig) -> Vec<ScenarioOutcome> {
    scenarios
        .iter()
        .map(|s| {
            let mut policy = IntersectionPolicy::with_default_capacity(s.name.as_str(), config.clone());
            s.run(&mut policy)
        })
        .collect()
}
