//! Example: Generate traffic/PM10 history files for the dashboard.
//!
//! Run with: cargo run -p ecoflow-testdata --example generate_dataset

use ecoflow_testdata::{generate_dataset, DailyShape, GeneratorConfig};
use std::fs;

fn main() {
    println!("EcoFlow Testdata Generator");
    println!("==========================\n");

    if let Err(e) = fs::create_dir_all("datasets") {
        eprintln!("Could not create datasets/: {}", e);
        return;
    }

    let variants = [
        ("city_center_4w", DailyShape::commuter_traffic(0.3, 3.0), DailyShape::evening_pm10(18.0, 42.0)),
        ("ring_road_4w", DailyShape::commuter_traffic(1.0, 6.0), DailyShape::evening_pm10(25.0, 60.0)),
        (
            "quiet_street_4w",
            DailyShape::commuter_traffic(0.1, 0.8),
            DailyShape::Flat { level: 15.0 },
        ),
    ];

    for (i, (name, traffic, pm10)) in variants.into_iter().enumerate() {
        let config = GeneratorConfig::new()
            .with_sample_interval_secs(60)
            .with_duration_days(28.0)
            .with_imei(&format!("86000000000000{}", i + 1))
            .with_traffic(traffic)
            .with_pm10(pm10)
            .with_seed(42);

        let dataset = generate_dataset(&config).with_name(name);

        let csv_path = format!("datasets/{}.csv", name);
        if let Err(e) = dataset.to_csv(&csv_path) {
            eprintln!("  Warning: Could not save {}: {}", csv_path, e);
        } else {
            println!("  Created {} ({} rows)", csv_path, dataset.len());
        }
    }

    println!("\nAll datasets generated successfully!");
}
