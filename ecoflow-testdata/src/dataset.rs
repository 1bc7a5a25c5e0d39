// EcoFlow Testdata - Dataset structures
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Dataset structures and I/O operations.
//!
//! The CSV layout matches what the sensor export produces:
//! `timestamp,imei,tr1,tr2,total_traffic,pm10`. `pm10` may be empty.

use chrono::NaiveDateTime;
use ecoflow::TrafficRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Timestamp format used in CSV files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const HEADER: [&str; 6] = ["timestamp", "imei", "tr1", "tr2", "total_traffic", "pm10"];

/// Dataset error types.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error at line {line}: {message}")]
    CsvParse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Empty dataset")]
    Empty,
}

/// One row: a traffic count and an optional PM10 reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    pub timestamp: NaiveDateTime,
    /// Sensor IMEI.
    pub imei: String,
    /// Vehicles in direction 1.
    pub tr1: f64,
    /// Vehicles in direction 2.
    pub tr2: f64,
    /// PM10 in µg/m³.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
}

impl DatasetRow {
    /// Both directions combined.
    pub fn total_traffic(&self) -> f64 {
        self.tr1 + self.tr2
    }

    /// Convert to a core traffic record.
    pub fn to_record(&self) -> TrafficRecord {
        let record = TrafficRecord::new(self.timestamp, self.tr1, self.tr2);
        if self.imei.is_empty() {
            record
        } else {
            record.with_source(self.imei.clone())
        }
    }
}

/// Dataset metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Dataset name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Generation seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Sample interval in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_interval_secs: Option<u32>,
}

/// A traffic and air quality history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Data rows, oldest first.
    pub rows: Vec<DatasetRow>,
    /// Metadata.
    #[serde(default)]
    pub metadata: DatasetMetadata,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row.
    pub fn add_row(&mut self, row: DatasetRow) {
        self.rows.push(row);
    }

    /// Get all rows.
    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    /// Get number of samples.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Traffic records for training and statistics.
    pub fn records(&self) -> Vec<TrafficRecord> {
        self.rows.iter().map(DatasetRow::to_record).collect()
    }

    /// PM10 readings, skipping rows without one.
    pub fn pm10_series(&self) -> Vec<(NaiveDateTime, f64)> {
        self.rows
            .iter()
            .filter_map(|r| r.pm10.map(|v| (r.timestamp, v)))
            .collect()
    }

    /// Latest PM10 reading.
    pub fn latest_pm10(&self) -> Option<f64> {
        self.rows.iter().rev().find_map(|r| r.pm10)
    }

    /// Set metadata.
    pub fn with_metadata(mut self, metadata: DatasetMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.metadata.name = Some(name.to_string());
        self
    }

    /// Export to CSV file.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", HEADER.join(","))?;

        for row in &self.rows {
            write!(
                writer,
                "{},{},{},{},{}",
                row.timestamp.format(TIMESTAMP_FORMAT),
                row.imei,
                row.tr1,
                row.tr2,
                row.total_traffic()
            )?;
            match row.pm10 {
                Some(v) => writeln!(writer, ",{:.1}", v)?,
                None => writeln!(writer, ",")?,
            }
        }

        writer.flush()?;
        Ok(())
    }

    /// Import from CSV file.
    ///
    /// Columns are located by name; `imei`, `total_traffic` and `pm10` are
    /// optional.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header = lines.next().ok_or(DatasetError::Empty)??;
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let position = |name: &str| columns.iter().position(|c| *c == name);
        let required = |name: &str| position(name).ok_or_else(|| DatasetError::MissingColumn(name.to_string()));

        let ts_col = required("timestamp")?;
        let tr1_col = required("tr1")?;
        let tr2_col = required("tr2")?;
        let imei_col = position("imei");
        let pm10_col = position("pm10");

        let mut dataset = Dataset::new();

        for (line_num, line_result) in lines.enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            let line_no = line_num + 2;
            let field = |col: usize| values.get(col).copied().unwrap_or("");

            let timestamp = NaiveDateTime::parse_from_str(field(ts_col), TIMESTAMP_FORMAT)
                .map_err(|e| DatasetError::CsvParse {
                    line: line_no,
                    message: format!("Invalid timestamp: {}", e),
                })?;
            let parse = |col: usize, name: &str| -> Result<f64, DatasetError> {
                field(col).parse().map_err(|_| DatasetError::CsvParse {
                    line: line_no,
                    message: format!("Invalid value for {}", name),
                })
            };

            let pm10 = match pm10_col {
                Some(col) if !field(col).is_empty() => Some(parse(col, "pm10")?),
                _ => None,
            };

            dataset.rows.push(DatasetRow {
                timestamp,
                imei: imei_col.map(field).unwrap_or_default().to_string(),
                tr1: parse(tr1_col, "tr1")?,
                tr2: parse(tr2_col, "tr2")?,
                pm10,
            });
        }

        Ok(dataset)
    }

    /// Export to JSON file.
    pub fn to_json(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Import from JSON file.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let dataset = serde_json::from_reader(reader)?;
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(8, minute, 0)
            .unwrap()
    }

    fn sample() -> Dataset {
        let mut dataset = Dataset::new().with_name("sample");
        dataset.add_row(DatasetRow {
            timestamp: at(0),
            imei: "860000000000001".to_string(),
            tr1: 3.0,
            tr2: 2.0,
            pm10: Some(22.5),
        });
        dataset.add_row(DatasetRow {
            timestamp: at(1),
            imei: "860000000000001".to_string(),
            tr1: 4.0,
            tr2: 1.0,
            pm10: None,
        });
        dataset
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.csv");

        let dataset = sample();
        dataset.to_csv(&path).unwrap();

        let loaded = Dataset::from_csv(&path).unwrap();
        assert_eq!(loaded.rows, dataset.rows);
        assert_eq!(loaded.latest_pm10(), Some(22.5));
    }

    #[test]
    fn test_csv_minimal_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("minimal.csv");
        std::fs::write(&path, "tr2,timestamp,tr1\n1,2025-03-10 08:00:00,4\n").unwrap();

        let loaded = Dataset::from_csv(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.rows[0].tr1, 4.0);
        assert_eq!(loaded.rows[0].tr2, 1.0);
        assert!(loaded.rows[0].imei.is_empty());
        assert!(loaded.latest_pm10().is_none());
    }

    #[test]
    fn test_csv_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "timestamp,tr1\n2025-03-10 08:00:00,4\n").unwrap();

        let err = Dataset::from_csv(&path).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(c) if c == "tr2"));
    }

    #[test]
    fn test_csv_bad_timestamp() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "timestamp,tr1,tr2\nyesterday,4,1\n").unwrap();

        let err = Dataset::from_csv(&path).unwrap_err();
        assert!(matches!(err, DatasetError::CsvParse { line: 2, .. }));
    }

    #[test]
    fn test_records_carry_source() {
        let records = sample().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total(), 5.0);
        assert_eq!(records[0].source_id.as_deref(), Some("860000000000001"));
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        let dataset = sample();
        dataset.to_json(&path).unwrap();
        assert_eq!(Dataset::from_json(&path).unwrap(), dataset);
    }
}
