// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Intersection policy
//!
//! A memoryless three-mode state machine. Every call to
//! [`IntersectionPolicy::decide`] recomputes the mode from scratch:
//!
//! 1. congestion check: volume above capacity extends the green phase,
//! 2. emergency override: PM10 above the emergency threshold reroutes,
//!    whatever the traffic status,
//! 3. otherwise heavy traffic maximizes flow, else standard operation.
//!
//! The only state that survives a call is the append-only decision history.

use crate::config::PolicyConfig;
use serde::{Deserialize, Serialize};

/// Operating mode of an intersection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    /// Standard timing
    #[default]
    Normal,
    /// Extended green to clear heavy traffic
    MaxFlow,
    /// Digital signs divert traffic away from polluted air
    Reroute,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::MaxFlow => "MAX_FLOW",
            Mode::Reroute => "REROUTE",
        }
    }

    /// Colour for dashboards
    pub fn color_code(&self) -> &'static str {
        match self {
            Mode::Normal => "green",
            Mode::MaxFlow => "yellow",
            Mode::Reroute => "red",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action text shown for a mode.
pub fn describe_action(mode: Mode) -> &'static str {
    match mode {
        Mode::Reroute => "Digital signs set to 'DETOUR' - Protecting public health",
        Mode::MaxFlow => "Green light cycle extended - Maximizing traffic flow",
        Mode::Normal => "Standard operation - All systems normal",
    }
}

/// Result of the congestion check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrafficStatus {
    Normal,
    Heavy,
}

/// Air assessment recorded with each decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AirStatus {
    Good,
    Acceptable,
    Hazardous,
}

/// Outcome of one `decide` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionDecision {
    pub mode: Mode,
    pub green_light_seconds: u32,
    pub reason: String,
    pub traffic_status: TrafficStatus,
    pub air_status: AirStatus,
}

impl IntersectionDecision {
    /// Action text for this decision's mode
    pub fn action(&self) -> &'static str {
        describe_action(self.mode)
    }

    /// Short status line, e.g. `MAX FLOW (Green: 60s)`
    pub fn status_label(&self) -> String {
        match self.mode {
            Mode::Reroute => "REROUTING (Toxic Air)".to_string(),
            Mode::MaxFlow => format!("MAX FLOW (Green: {}s)", self.green_light_seconds),
            Mode::Normal => format!("STANDARD (Green: {}s)", self.green_light_seconds),
        }
    }
}

/// History entry: inputs and outputs of one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub predicted_traffic: f64,
    pub pollutant: f64,
    pub traffic_status: TrafficStatus,
    pub air_status: AirStatus,
    pub mode: Mode,
    pub green_light_seconds: u32,
    pub reason: String,
}

/// Smart intersection balancing traffic flow against air quality
#[derive(Debug, Clone)]
pub struct IntersectionPolicy {
    name: String,
    capacity_threshold: f64,
    config: PolicyConfig,
    mode: Mode,
    green_light_seconds: u32,
    history: Vec<DecisionRecord>,
}

impl IntersectionPolicy {
    /// Create a policy for a named intersection.
    ///
    /// `capacity_threshold` is in vehicles per hour.
    pub fn new(name: impl Into<String>, capacity_threshold: f64, config: PolicyConfig) -> Self {
        let green_light_seconds = config.standard_green_secs;
        Self {
            name: name.into(),
            capacity_threshold,
            config,
            mode: Mode::Normal,
            green_light_seconds,
            history: Vec::new(),
        }
    }

    /// Create a policy using the configured default capacity
    pub fn with_default_capacity(name: impl Into<String>, config: PolicyConfig) -> Self {
        let capacity = config.default_capacity_threshold;
        Self::new(name, capacity, config)
    }

    /// Decide light timing for a predicted volume (vehicles/hour) and a
    /// PM10 reading (µg/m³).
    ///
    /// Total over its numeric domain. Appends exactly one history entry.
    pub fn decide(&mut self, predicted_traffic: f64, pollutant: f64) -> IntersectionDecision {
        let (traffic_status, green_light_seconds) = if predicted_traffic > self.capacity_threshold
        {
            (TrafficStatus::Heavy, self.config.extended_green_secs)
        } else {
            (TrafficStatus::Normal, self.config.standard_green_secs)
        };

        let (mode, air_status, reason) = if pollutant > self.config.emergency_pm10_threshold {
            (
                Mode::Reroute,
                AirStatus::Hazardous,
                format!("PM10 level ({:.1} µg/m³) exceeds safe limit", pollutant),
            )
        } else if traffic_status == TrafficStatus::Heavy {
            (
                Mode::MaxFlow,
                AirStatus::Acceptable,
                format!("High traffic volume ({:.0} cars/hr)", predicted_traffic),
            )
        } else {
            (
                Mode::Normal,
                AirStatus::Good,
                "Normal traffic and air quality".to_string(),
            )
        };

        if mode == Mode::Reroute {
            log::warn!("{}: rerouting, {}", self.name, reason);
        } else {
            log::debug!("{}: {} ({})", self.name, mode, reason);
        }

        self.mode = mode;
        self.green_light_seconds = green_light_seconds;
        self.history.push(DecisionRecord {
            predicted_traffic,
            pollutant,
            traffic_status,
            air_status,
            mode,
            green_light_seconds,
            reason: reason.clone(),
        });

        IntersectionDecision {
            mode,
            green_light_seconds,
            reason,
            traffic_status,
            air_status,
        }
    }

    /// Action text for the current mode
    pub fn describe_current_action(&self) -> &'static str {
        describe_action(self.mode)
    }

    /// Back to standard timing with an empty history
    pub fn reset(&mut self) {
        self.mode = Mode::Normal;
        self.green_light_seconds = self.config.standard_green_secs;
        self.history.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity_threshold(&self) -> f64 {
        self.capacity_threshold
    }

    /// Mode chosen by the latest decision
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Green phase chosen by the latest decision
    pub fn green_light_seconds(&self) -> u32 {
        self.green_light_seconds
    }

    /// Decisions since construction or the last reset, oldest first
    pub fn history(&self) -> &[DecisionRecord] {
        &self.history
    }

    /// Latest decision record
    pub fn last_decision(&self) -> Option<&DecisionRecord> {
        self.history.last()
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> IntersectionPolicy {
        IntersectionPolicy::new("Test", 120.0, PolicyConfig::default())
    }

    #[test]
    fn test_initial_state() {
        let p = policy();
        assert_eq!(p.mode(), Mode::Normal);
        assert_eq!(p.green_light_seconds(), 30);
        assert!(p.history().is_empty());
    }

    #[test]
    fn test_normal_conditions() {
        let mut p = policy();
        let d = p.decide(50.0, 20.0);
        assert_eq!(d.mode, Mode::Normal);
        assert_eq!(d.green_light_seconds, 30);
        assert_eq!(d.traffic_status, TrafficStatus::Normal);
        assert_eq!(d.air_status, AirStatus::Good);
        assert_eq!(d.reason, "Normal traffic and air quality");
    }

    #[test]
    fn test_rush_hour_max_flow() {
        let mut p = policy();
        let d = p.decide(150.0, 25.0);
        assert_eq!(d.mode, Mode::MaxFlow);
        assert_eq!(d.green_light_seconds, 60);
        assert!(d.reason.contains("traffic volume"));
        assert!(d.reason.contains("150"));
        assert_eq!(d.status_label(), "MAX FLOW (Green: 60s)");
    }

    #[test]
    fn test_toxic_air_reroutes() {
        let mut p = policy();
        let d = p.decide(80.0, 65.0);
        assert_eq!(d.mode, Mode::Reroute);
        assert_eq!(d.air_status, AirStatus::Hazardous);
        assert!(d.reason.contains("65.0"));
        assert_eq!(d.green_light_seconds, 30);
    }

    #[test]
    fn test_emergency_overrides_congestion() {
        let mut p = policy();
        let d = p.decide(5000.0, 999.0);
        assert_eq!(d.mode, Mode::Reroute);
        assert_eq!(d.traffic_status, TrafficStatus::Heavy);
        // Congestion timing is still computed under the override
        assert_eq!(d.green_light_seconds, 60);
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut p = policy();
        assert_eq!(p.decide(120.0, 50.0).mode, Mode::Normal);
        assert_eq!(p.decide(120.01, 50.0).mode, Mode::MaxFlow);
        assert_eq!(p.decide(0.0, 50.01).mode, Mode::Reroute);
    }

    #[test]
    fn test_accessors_track_latest_decision() {
        let mut p = policy();
        p.decide(150.0, 25.0);
        assert_eq!(p.mode(), Mode::MaxFlow);
        assert_eq!(p.green_light_seconds(), 60);
        assert_eq!(
            p.describe_current_action(),
            "Green light cycle extended - Maximizing traffic flow"
        );

        p.decide(10.0, 10.0);
        assert_eq!(p.mode(), Mode::Normal);
        assert_eq!(p.green_light_seconds(), 30);
    }

    #[test]
    fn test_history_and_reset() {
        let mut p = policy();
        p.decide(50.0, 20.0);
        p.decide(150.0, 25.0);
        p.decide(80.0, 65.0);
        assert_eq!(p.history().len(), 3);
        assert_eq!(p.history()[1].mode, Mode::MaxFlow);
        assert_eq!(p.last_decision().unwrap().pollutant, 65.0);

        p.reset();
        assert!(p.history().is_empty());
        assert_eq!(p.mode(), Mode::Normal);
        assert_eq!(p.green_light_seconds(), 30);

        p.decide(50.0, 20.0);
        assert_eq!(p.history().len(), 1);
    }

    #[test]
    fn test_negative_inputs_are_accepted() {
        let mut p = policy();
        let d = p.decide(-10.0, -5.0);
        assert_eq!(d.mode, Mode::Normal);
    }

    #[test]
    fn test_custom_config() {
        let config = PolicyConfig {
            standard_green_secs: 20,
            extended_green_secs: 45,
            emergency_pm10_threshold: 80.0,
            ..Default::default()
        };
        let mut p = IntersectionPolicy::new("Custom", 1000.0, config);
        let d = p.decide(1200.0, 65.0);
        assert_eq!(d.mode, Mode::MaxFlow);
        assert_eq!(d.green_light_seconds, 45);
    }

    #[test]
    fn test_describe_action_and_colors() {
        assert!(describe_action(Mode::Reroute).contains("DETOUR"));
        assert_eq!(Mode::Reroute.color_code(), "red");
        assert_eq!(Mode::MaxFlow.color_code(), "yellow");
        assert_eq!(Mode::Normal.color_code(), "green");
    }

    #[test]
    fn test_mode_serializes_screaming_case() {
        let json = serde_json::to_string(&Mode::MaxFlow).unwrap();
        assert_eq!(json, "\"MAX_FLOW\"");
    }
}
