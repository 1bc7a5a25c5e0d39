// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Historical traffic series
//!
//! Sensor records arrive as flat `(timestamp, direction A, direction B)`
//! rows, typically one per minute. Forecasters train on interval totals, so
//! records are floored to the sampling grid and summed per bucket.

use crate::forecast::Observation;
use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw sensor record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    pub timestamp: NaiveDateTime,
    /// Device identifier, when the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Vehicles counted in direction A
    pub direction_a: f64,
    /// Vehicles counted in direction B
    pub direction_b: f64,
}

impl TrafficRecord {
    pub fn new(timestamp: NaiveDateTime, direction_a: f64, direction_b: f64) -> Self {
        Self {
            timestamp,
            source_id: None,
            direction_a,
            direction_b,
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Both directions combined
    pub fn total(&self) -> f64 {
        self.direction_a + self.direction_b
    }
}

/// Floor a timestamp to the start of its `interval_minutes` bucket.
///
/// Buckets restart at midnight.
pub fn floor_to_interval(timestamp: NaiveDateTime, interval_minutes: u32) -> NaiveDateTime {
    let bucket_secs = i64::from(interval_minutes.max(1)) * 60;
    let offset = i64::from(timestamp.num_seconds_from_midnight()) % bucket_secs;
    timestamp - Duration::seconds(offset) - Duration::nanoseconds(i64::from(timestamp.nanosecond()))
}

/// Summed counts for one bucket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntervalBucket {
    pub start: NaiveDateTime,
    pub total: f64,
    pub direction_a: f64,
    pub direction_b: f64,
}

/// Floor and sum records per bucket, ordered by bucket start.
pub fn aggregate_records(records: &[TrafficRecord], interval_minutes: u32) -> Vec<IntervalBucket> {
    let mut buckets: BTreeMap<NaiveDateTime, IntervalBucket> = BTreeMap::new();

    for record in records {
        let start = floor_to_interval(record.timestamp, interval_minutes);
        let bucket = buckets.entry(start).or_insert(IntervalBucket {
            start,
            total: 0.0,
            direction_a: 0.0,
            direction_b: 0.0,
        });
        bucket.total += record.total();
        bucket.direction_a += record.direction_a;
        bucket.direction_b += record.direction_b;
    }

    buckets.into_values().collect()
}

/// Training series derived from records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSeries {
    /// Bucket width (minutes)
    pub interval_minutes: u32,
    /// Both directions combined
    pub total: Vec<Observation>,
    pub direction_a: Vec<Observation>,
    pub direction_b: Vec<Observation>,
    /// Identifier of the first record's source
    pub source_id: Option<String>,
}

impl TrafficSeries {
    /// Build interval series from raw records.
    ///
    /// No records gives an empty series.
    pub fn from_records(records: &[TrafficRecord], interval_minutes: u32) -> Self {
        let buckets = aggregate_records(records, interval_minutes);

        log::debug!(
            "Aggregated {} records into {} buckets of {} minutes",
            records.len(),
            buckets.len(),
            interval_minutes
        );

        Self {
            interval_minutes,
            total: buckets
                .iter()
                .map(|b| Observation::new(b.start, b.total))
                .collect(),
            direction_a: buckets
                .iter()
                .map(|b| Observation::new(b.start, b.direction_a))
                .collect(),
            direction_b: buckets
                .iter()
                .map(|b| Observation::new(b.start, b.direction_b))
                .collect(),
            source_id: records.iter().find_map(|r| r.source_id.clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    /// First and last bucket start
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.total.first()?.timestamp, self.total.last()?.timestamp))
    }

    /// Mean total per bucket
    pub fn mean_total(&self) -> Option<f64> {
        if self.total.is_empty() {
            return None;
        }
        Some(self.total.iter().map(|o| o.value).sum::<f64>() / self.total.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn test_floor_to_interval() {
        assert_eq!(floor_to_interval(at(8, 14, 59), 15), at(8, 0, 0));
        assert_eq!(floor_to_interval(at(8, 15, 0), 15), at(8, 15, 0));
        assert_eq!(floor_to_interval(at(23, 59, 30), 60), at(23, 0, 0));
    }

    #[test]
    fn test_aggregate_sums_per_bucket() {
        let records = vec![
            TrafficRecord::new(at(8, 0, 0), 3.0, 2.0),
            TrafficRecord::new(at(8, 7, 0), 4.0, 1.0),
            TrafficRecord::new(at(8, 16, 0), 1.0, 1.0),
        ];
        let buckets = aggregate_records(&records, 15);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, at(8, 0, 0));
        assert_eq!(buckets[0].total, 10.0);
        assert_eq!(buckets[0].direction_a, 7.0);
        assert_eq!(buckets[0].direction_b, 3.0);
        assert_eq!(buckets[1].total, 2.0);
    }

    #[test]
    fn test_aggregate_orders_unsorted_input() {
        let records = vec![
            TrafficRecord::new(at(9, 0, 0), 1.0, 0.0),
            TrafficRecord::new(at(8, 0, 0), 2.0, 0.0),
        ];
        let buckets = aggregate_records(&records, 15);
        assert_eq!(buckets[0].start, at(8, 0, 0));
        assert_eq!(buckets[1].start, at(9, 0, 0));
    }

    #[test]
    fn test_series_from_records() {
        let records = vec![
            TrafficRecord::new(at(8, 0, 0), 3.0, 2.0).with_source("860000000000001"),
            TrafficRecord::new(at(8, 20, 0), 4.0, 4.0),
        ];
        let series = TrafficSeries::from_records(&records, 15);
        assert_eq!(series.len(), 2);
        assert_eq!(series.direction_a[1].value, 4.0);
        assert_eq!(series.source_id.as_deref(), Some("860000000000001"));
        assert_eq!(series.time_range(), Some((at(8, 0, 0), at(8, 15, 0))));
        assert_eq!(series.mean_total(), Some(6.5));
    }

    #[test]
    fn test_empty_records() {
        let series = TrafficSeries::from_records(&[], 15);
        assert!(series.is_empty());
        assert!(series.time_range().is_none());
        assert!(series.mean_total().is_none());
    }
}
