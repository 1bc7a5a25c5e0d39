//! Intersection network
//!
//! A keyed registry of [`IntersectionPolicy`] instances. Each entry decides
//! on its own; the network adds no coordination between intersections.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::config::PolicyConfig;
use crate::policy::{IntersectionPolicy, Mode};

/// Registry of intersections by name
#[derive(Debug, Default)]
pub struct IntersectionNetwork {
    /// Policies keyed by intersection name
    intersections: HashMap<String, IntersectionPolicy>,
    /// Configuration handed to every new policy
    config: PolicyConfig,
}

impl IntersectionNetwork {
    /// Create an empty network with default policy settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom policy configuration
    pub fn with_config(config: PolicyConfig) -> Self {
        Self {
            intersections: HashMap::new(),
            config,
        }
    }

    /// Register an intersection.
    ///
    /// An existing entry with the same name is replaced (last write wins),
    /// history included.
    pub fn add(&mut self, name: &str, capacity_threshold: f64) -> &mut IntersectionPolicy {
        let policy = IntersectionPolicy::new(name, capacity_threshold, self.config.clone());
        match self.intersections.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                log::debug!("Replaced intersection {}", name);
                entry.insert(policy);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(policy),
        }
    }

    /// Register an intersection with the configured default capacity
    pub fn add_default(&mut self, name: &str) -> &mut IntersectionPolicy {
        let capacity = self.config.default_capacity_threshold;
        self.add(name, capacity)
    }

    /// Get an intersection
    pub fn get(&self, name: &str) -> Option<&IntersectionPolicy> {
        self.intersections.get(name)
    }

    /// Get mutable intersection
    pub fn get_mut(&mut self, name: &str) -> Option<&mut IntersectionPolicy> {
        self.intersections.get_mut(name)
    }

    /// Remove an intersection, returning it
    pub fn remove(&mut self, name: &str) -> Option<IntersectionPolicy> {
        self.intersections.remove(name)
    }

    /// Current mode of every intersection
    pub fn status_snapshot(&self) -> BTreeMap<String, Mode> {
        self.intersections
            .iter()
            .map(|(name, policy)| (name.clone(), policy.mode()))
            .collect()
    }

    /// Intersection names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.intersections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered intersections
    pub fn len(&self) -> usize {
        self.intersections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    /// Iterate over all intersections
    pub fn iter(&self) -> impl Iterator<Item = (&String, &IntersectionPolicy)> {
        self.intersections.iter()
    }

    /// Policy configuration for new intersections
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_creation() {
        let network = IntersectionNetwork::new();
        assert!(network.is_empty());
        assert!(network.status_snapshot().is_empty());
    }

    #[test]
    fn test_add_and_get() {
        let mut network = IntersectionNetwork::new();
        network.add("Heilbronn Center", 1000.0);
        network.add_default("Bahnhof");

        assert_eq!(network.len(), 2);
        assert_eq!(network.get("Heilbronn Center").unwrap().capacity_threshold(), 1000.0);
        assert_eq!(network.get("Bahnhof").unwrap().capacity_threshold(), 120.0);
        assert!(network.get("Unknown").is_none());
    }

    #[test]
    fn test_add_returns_usable_handle() {
        let mut network = IntersectionNetwork::new();
        let decision = network.add("A", 120.0).decide(150.0, 25.0);
        assert_eq!(decision.mode, Mode::MaxFlow);
        assert_eq!(network.get("A").unwrap().history().len(), 1);
    }

    #[test]
    fn test_duplicate_name_overwrites() {
        let mut network = IntersectionNetwork::new();
        network.add("A", 120.0).decide(150.0, 25.0);
        network.add("A", 500.0);

        assert_eq!(network.len(), 1);
        let policy = network.get("A").unwrap();
        assert_eq!(policy.capacity_threshold(), 500.0);
        assert!(policy.history().is_empty());
        assert_eq!(policy.mode(), Mode::Normal);
    }

    #[test]
    fn test_status_snapshot() {
        let mut network = IntersectionNetwork::new();
        network.add("A", 120.0);
        network.add("B", 120.0);
        network.add("C", 120.0);

        network.get_mut("B").unwrap().decide(150.0, 25.0);
        network.get_mut("C").unwrap().decide(80.0, 65.0);

        let snapshot = network.status_snapshot();
        assert_eq!(snapshot["A"], Mode::Normal);
        assert_eq!(snapshot["B"], Mode::MaxFlow);
        assert_eq!(snapshot["C"], Mode::Reroute);
        assert_eq!(network.names(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_network_config_applies_to_policies() {
        let config = PolicyConfig {
            extended_green_secs: 75,
            ..Default::default()
        };
        let mut network = IntersectionNetwork::with_config(config);
        let decision = network.add("A", 100.0).decide(200.0, 10.0);
        assert_eq!(decision.green_light_seconds, 75);
    }

    #[test]
    fn test_remove() {
        let mut network = IntersectionNetwork::new();
        network.add("A", 120.0);
        assert!(network.remove("A").is_some());
        assert!(network.remove("A").is_none());
        assert!(network.is_empty());
    }
}
