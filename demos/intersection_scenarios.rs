//! Intersection scenarios - the three reference situations for one intersection
//!
//! Run with: cargo run --example intersection_scenarios

use ecoflow::{classify, IntersectionPolicy, PolicyConfig};

fn main() {
    let mut policy = IntersectionPolicy::new("Heilbronn Center", 120.0, PolicyConfig::default());

    let scenarios = [
        ("Normal day", 50.0, 20.0),
        ("Rush hour", 150.0, 25.0),
        ("Toxic air", 80.0, 65.0),
    ];

    println!("=== EcoFlow Intersection Scenarios ===");
    println!(
        "Intersection: {} (capacity {:.0} cars/hr)\n",
        policy.name(),
        policy.capacity_threshold()
    );

    for (label, traffic, pm10) in scenarios {
        let decision = policy.decide(traffic, pm10);
        let health = classify(pm10);

        println!("--- {} ---", label);
        println!("  Predicted traffic: {:.0} cars/hr", traffic);
        println!("  PM10:              {:.1} µg/m³ ({})", pm10, health.level);
        println!("  Mode:              {} [{}]", decision.mode, decision.mode.color_code());
        println!("  Status:            {}", decision.status_label());
        println!("  Green light:       {}s", decision.green_light_seconds);
        println!("  Reason:            {}", decision.reason);
        println!("  Action:            {}", decision.action());
        println!("  Health:            {}\n", health.message);
    }

    println!("Decisions recorded: {}", policy.history().len());
}
