// EcoFlow Dashboard - HTTP dashboard for EcoFlow intersections
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # EcoFlow Dashboard
//!
//! HTTP dashboard and Prometheus exporter for EcoFlow intersections.
//!
//! ## Usage
//!
//! ```bash
//! # Train on a history export and serve two intersections
//! ecoflow-dashboard --csv history.csv -i Center -i Ring
//!
//! # Reuse a saved model on a custom port
//! ecoflow-dashboard --model model.json --port 9090
//! ```

mod handlers;
mod history;
mod metrics;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use ecoflow::{
    EcoflowConfig, IntersectionNetwork, ModelArtifact, TrafficPredictor, TrafficSeries,
    TrafficStatistics,
};
use history::History;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// EcoFlow Dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8050")]
    port: u16,

    /// Traffic history CSV used for training and statistics
    #[arg(short, long)]
    csv: Option<String>,

    /// Saved model artifact (JSON); skips training when it loads
    #[arg(short, long)]
    model: Option<String>,

    /// Write the trained model to this path
    #[arg(long)]
    save_model: Option<String>,

    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<String>,

    /// Intersections to manage (repeatable); the first is the default
    #[arg(short, long = "intersection", default_value = "Center")]
    intersections: Vec<String>,

    /// Capacity threshold in vehicles per hour (defaults to the config value)
    #[arg(long)]
    capacity: Option<f64>,

    /// Initial PM10 reading (µg/m³) when the history has none
    #[arg(long, default_value = "25.0")]
    pm10: f64,

    /// Also train per-direction models
    #[arg(long)]
    train_directions: bool,

    /// Disable simulated predictions when no model is trained
    #[arg(long)]
    no_simulate: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Fatal server errors.
#[derive(Debug, thiserror::Error)]
enum DashboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), DashboardError> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };
        EnvFilter::from_default_env().add_directive(level.into())
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("EcoFlow Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(args.config.as_deref());

    // History: training data, statistics and the latest PM10 reading
    let history = match args.csv.as_deref() {
        Some(path) => match History::from_csv(path) {
            Ok(history) => Some(history),
            Err(e) => {
                error!("Failed to load history: {}", e);
                None
            }
        },
        None => {
            info!("No history specified, statistics unavailable");
            None
        }
    };

    let predictor = build_predictor(&args, &config, history.as_ref());

    let statistics = history
        .as_ref()
        .and_then(|h| TrafficStatistics::from_records(&h.records));
    if let Some(stats) = &statistics {
        info!(
            "Peak hour {:02}:00 ({:.0} vehicles/hr), rush hours {}",
            stats.peak_hour,
            stats.peak_vehicles_per_hour,
            stats.rush_hours_formatted()
        );
    }

    let mut network = IntersectionNetwork::with_config(config.policy.clone());
    for name in &args.intersections {
        let capacity = args
            .capacity
            .unwrap_or(config.policy.default_capacity_threshold);
        network.add(name, capacity);
        metrics::record_reset(name, config.policy.standard_green_secs);
    }
    let default_intersection = args
        .intersections
        .first()
        .cloned()
        .unwrap_or_else(|| "Center".to_string());
    if network.is_empty() {
        network.add_default(&default_intersection);
    }
    info!("Managing intersections: {}", network.names().join(", "));

    let initial_pm10 = history
        .as_ref()
        .and_then(|h| h.latest_pm10)
        .unwrap_or(args.pm10);
    metrics::update_air_quality_metrics(&ecoflow::classify(initial_pm10));

    let records = history.as_ref().map_or(0, History::len);
    metrics::update_model_metrics(predictor.is_trained(), records);

    let state = Arc::new(
        AppState::new(config, network, predictor, default_intersection, initial_pm10)
            .with_statistics(statistics, records)
            .with_simulation(!args.no_simulate),
    );
    if !state.predictor.is_trained() && !state.simulate {
        warn!("No trained model and simulation disabled, /prediction will return 503");
    }

    // Build router
    let app = Router::new()
        .route("/", get(handlers::root_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/prediction", get(handlers::prediction_handler))
        .route("/air-quality", get(handlers::air_quality_handler))
        .route("/statistics", get(handlers::statistics_handler))
        .route("/decide", post(handlers::decide_handler))
        .route("/intersections/:name/history", get(handlers::history_handler))
        .route("/intersections/:name/reset", post(handlers::reset_handler))
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Starting server on http://{}", addr);
    info!("Metrics endpoint: http://{}/metrics", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Load the configuration file, falling back to defaults.
fn load_config(path: Option<&str>) -> EcoflowConfig {
    let Some(path) = path else {
        return EcoflowConfig::default();
    };
    match EcoflowConfig::from_json_file(path) {
        Ok(config) => {
            info!("Configuration loaded from {}", path);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}, using defaults", e);
            EcoflowConfig::default()
        }
    }
}

/// Load a saved model or train one from history.
fn build_predictor(
    args: &Args,
    config: &EcoflowConfig,
    history: Option<&History>,
) -> TrafficPredictor {
    if let Some(path) = args.model.as_deref() {
        let loaded: ecoflow::Result<ModelArtifact> = ModelArtifact::load(path);
        match loaded {
            Ok(artifact) => {
                if let Some(trained_at) = artifact.metadata.trained_at {
                    info!("Using model trained at {}", trained_at);
                }
                return artifact.into_predictor(config.prediction.clone());
            }
            Err(e) => warn!("Failed to load model: {}", e),
        }
    }

    let mut predictor = TrafficPredictor::new(config.prediction.clone());
    let Some(history) = history else {
        info!("No training data, predictor stays untrained");
        return predictor;
    };

    let series = TrafficSeries::from_records(
        &history.records,
        config.prediction.sample_interval_minutes,
    );
    predictor.train(&series, args.train_directions);

    if let Some(path) = args.save_model.as_deref() {
        if let Err(e) = ModelArtifact::from_predictor(&predictor).and_then(|a| a.save(path)) {
            error!("Failed to save model: {}", e);
        }
    }

    predictor
}
