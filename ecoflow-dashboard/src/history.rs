// EcoFlow Dashboard - Traffic history loader
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Loads sensor history exported as CSV.
//!
//! Expected header: `timestamp,imei,tr1,tr2,total_traffic`. Only
//! `timestamp`, `tr1` and `tr2` are required; a `pm10` column, when
//! present, seeds the current air quality reading. Other columns are
//! ignored.

use chrono::NaiveDateTime;
use ecoflow::TrafficRecord;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// One CSV row as exported by the sensor.
#[derive(Debug, Deserialize)]
struct HistoryRow {
    timestamp: String,
    imei: Option<String>,
    tr1: f64,
    tr2: f64,
    pm10: Option<f64>,
}

/// Records and the latest PM10 value from a history file.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub records: Vec<TrafficRecord>,
    pub latest_pm10: Option<f64>,
}

impl History {
    /// Load and sort a history CSV.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HistoryError::FileNotFound(path.display().to_string()));
        }

        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;

        let mut records = Vec::new();
        let mut latest_pm10: Option<(NaiveDateTime, f64)> = None;

        for (index, result) in reader.deserialize::<HistoryRow>().enumerate() {
            let row = result?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| HistoryError::InvalidTimestamp {
                line: index + 2,
                value: row.timestamp.clone(),
            })?;

            if let Some(pm10) = row.pm10 {
                if latest_pm10.map_or(true, |(ts, _)| timestamp >= ts) {
                    latest_pm10 = Some((timestamp, pm10));
                }
            }

            let record = TrafficRecord::new(timestamp, row.tr1, row.tr2);
            records.push(match row.imei.filter(|s| !s.is_empty()) {
                Some(imei) => record.with_source(imei),
                None => record,
            });
        }

        if records.is_empty() {
            return Err(HistoryError::EmptyDataset);
        }

        records.sort_by_key(|r| r.timestamp);
        debug!(
            "History spans {} to {}",
            records[0].timestamp,
            records[records.len() - 1].timestamp
        );
        info!("Loaded {} traffic records from {}", records.len(), path.display());

        Ok(Self {
            records,
            latest_pm10: latest_pm10.map(|(_, v)| v),
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// History loading errors.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid timestamp at line {line}: {value}")]
    InvalidTimestamp { line: usize, value: String },

    #[error("Empty dataset")]
    EmptyDataset,
}
