//! Network demo - trains a predictor on a synthetic week and drives several
//! intersections through one day
//!
//! Run with: cargo run --example network_demo

use chrono::{Duration, NaiveDate, Timelike};
use ecoflow::{
    IntersectionNetwork, Mode, PredictionConfig, TrafficPredictor, TrafficRecord, TrafficSeries,
    TrafficStatistics,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    let mut rng = StdRng::seed_from_u64(2025);
    let start = NaiveDate::from_ymd_opt(2025, 3, 10)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    // One week of per-minute counts with commuter peaks
    let records: Vec<TrafficRecord> = (0..7 * 24 * 60)
        .map(|m| {
            let ts = start + Duration::minutes(m);
            let base: f64 = match ts.hour() {
                7..=9 | 17..=19 => 2.5,
                10..=16 => 1.3,
                _ => 0.4,
            };
            let a = (base * 0.55 + rng.gen_range(-0.2..0.2)).max(0.0);
            let b = (base * 0.45 + rng.gen_range(-0.2..0.2)).max(0.0);
            TrafficRecord::new(ts, a, b)
        })
        .collect();

    println!("=== EcoFlow Network Demo ===\n");

    if let Some(stats) = TrafficStatistics::from_records(&records) {
        println!("Average traffic: {:.0} cars/hr", stats.avg_vehicles_per_hour);
        println!(
            "Peak hour:       {:02}:00 ({:.0} cars/hr)",
            stats.peak_hour, stats.peak_vehicles_per_hour
        );
        println!("Rush hours:      {}", stats.rush_hours_formatted());
        println!("Quiet hours:     {}\n", stats.quiet_hours_formatted());
    }

    let mut predictor = TrafficPredictor::new(PredictionConfig::default());
    predictor.train(&TrafficSeries::from_records(&records, 15), true);

    let mut network = IntersectionNetwork::new();
    network.add("Heilbronn Center", 120.0);
    network.add("Bahnhof", 150.0);
    network.add("Neckarufer", 90.0);

    let names: Vec<String> = network.names().iter().map(|s| s.to_string()).collect();
    let day = start + Duration::weeks(1);

    println!("{:<6} {:>10} {:>7}  {}", "Time", "cars/hr", "PM10", "Modes");
    for hour in (0..24).step_by(2) {
        let now = day + Duration::hours(hour);
        let Some(prediction) = predictor.current_prediction(now, 15) else {
            println!("No prediction available");
            return;
        };

        // Pollution builds up during the evening peak
        let pm10 = if (17..=19).contains(&hour) {
            rng.gen_range(45.0..70.0)
        } else {
            rng.gen_range(10.0..35.0)
        };

        let mut modes = Vec::new();
        for name in &names {
            if let Some(policy) = network.get_mut(name) {
                let decision = policy.decide(prediction.vehicles_per_hour(), pm10);
                modes.push(format!("{}={}", name, decision.mode));
            }
        }

        println!(
            "{:02}:00  {:>10.0} {:>7.1}  {}",
            hour,
            prediction.vehicles_per_hour(),
            pm10,
            modes.join(", ")
        );
    }

    println!("\nFinal status:");
    for (name, mode) in network.status_snapshot() {
        let marker = if mode == Mode::Reroute { "!" } else { " " };
        println!("  {} {:<18} {}", marker, name, mode);
    }
}
