// EcoFlow - Smart intersection decision engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Historical traffic statistics
//!
//! Summaries of per-minute records by hour of day: peak hour, rush hours
//! (hourly mean at or above the 75th percentile), quiet hours (at or below
//! the 25th percentile), and weekday versus weekend averages.

use crate::series::TrafficRecord;
use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Traffic profile for one hour of the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProfile {
    /// Hour of day (0-23)
    pub hour: u32,
    /// Mean vehicles per minute
    pub mean_per_minute: f64,
    /// Median vehicles per minute
    pub median_per_minute: f64,
    /// Highest per-minute count seen
    pub max_per_minute: f64,
    /// Mean as vehicles per hour, rounded
    pub vehicles_per_hour: f64,
}

/// Summary of a historical record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficStatistics {
    /// Hours that have data, ascending
    pub hourly: Vec<HourlyProfile>,
    /// Overall mean, vehicles per hour
    pub avg_vehicles_per_hour: f64,
    pub peak_hour: u32,
    pub peak_vehicles_per_hour: f64,
    pub rush_hours: Vec<u32>,
    pub quiet_hours: Vec<u32>,
    /// 75th percentile of hourly means, vehicles per hour
    pub rush_threshold_per_hour: f64,
    /// 25th percentile of hourly means, vehicles per hour
    pub quiet_threshold_per_hour: f64,
    /// Mean over Monday-Friday records, vehicles per hour
    pub weekday_avg_per_hour: Option<f64>,
    /// Mean over Saturday/Sunday records, vehicles per hour
    pub weekend_avg_per_hour: Option<f64>,
}

impl TrafficStatistics {
    /// Summarize per-minute records. `None` when there are no records.
    pub fn from_records(records: &[TrafficRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let mut by_hour: Vec<Vec<f64>> = vec![Vec::new(); 24];
        for record in records {
            by_hour[record.timestamp.hour() as usize].push(record.total());
        }

        let hourly: Vec<HourlyProfile> = by_hour
            .into_iter()
            .enumerate()
            .filter(|(_, values)| !values.is_empty())
            .map(|(hour, mut values)| {
                values.sort_by(|a, b| a.total_cmp(b));
                let mean = mean(&values).unwrap_or(0.0);
                HourlyProfile {
                    hour: hour as u32,
                    mean_per_minute: mean,
                    median_per_minute: quantile(&values, 0.5).unwrap_or(0.0),
                    max_per_minute: values.last().copied().unwrap_or(0.0),
                    vehicles_per_hour: (mean * 60.0).round(),
                }
            })
            .collect();

        let mut hourly_means: Vec<f64> = hourly.iter().map(|h| h.mean_per_minute).collect();
        hourly_means.sort_by(|a, b| a.total_cmp(b));
        let rush_threshold = quantile(&hourly_means, 0.75)?;
        let quiet_threshold = quantile(&hourly_means, 0.25)?;

        // Earliest hour wins ties
        let peak = hourly.iter().fold(None, |best: Option<&HourlyProfile>, h| match best {
            Some(b) if b.mean_per_minute >= h.mean_per_minute => Some(b),
            _ => Some(h),
        })?;

        let rush_hours = hourly
            .iter()
            .filter(|h| h.mean_per_minute >= rush_threshold)
            .map(|h| h.hour)
            .collect();
        let quiet_hours = hourly
            .iter()
            .filter(|h| h.mean_per_minute <= quiet_threshold)
            .map(|h| h.hour)
            .collect();

        let totals: Vec<f64> = records.iter().map(TrafficRecord::total).collect();
        let (weekend, weekday): (Vec<&TrafficRecord>, Vec<&TrafficRecord>) = records
            .iter()
            .partition(|r| matches!(r.timestamp.weekday(), Weekday::Sat | Weekday::Sun));

        Some(Self {
            avg_vehicles_per_hour: mean(&totals).unwrap_or(0.0) * 60.0,
            peak_hour: peak.hour,
            peak_vehicles_per_hour: peak.vehicles_per_hour,
            rush_hours,
            quiet_hours,
            rush_threshold_per_hour: rush_threshold * 60.0,
            quiet_threshold_per_hour: quiet_threshold * 60.0,
            weekday_avg_per_hour: mean_total(&weekday).map(|m| m * 60.0),
            weekend_avg_per_hour: mean_total(&weekend).map(|m| m * 60.0),
            hourly,
        })
    }

    /// Rush hours formatted as ranges
    pub fn rush_hours_formatted(&self) -> String {
        format_hours(&self.rush_hours)
    }

    /// Quiet hours formatted as ranges
    pub fn quiet_hours_formatted(&self) -> String {
        format_hours(&self.quiet_hours)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn mean_total(records: &[&TrafficRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(records.iter().map(|r| r.total()).sum::<f64>() / records.len() as f64)
}

/// Linear-interpolated quantile of sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Collapse hours into ranges: `[7, 8, 9, 17]` becomes `07:00-09:00, 17:00`.
pub fn format_hours(hours: &[u32]) -> String {
    if hours.is_empty() {
        return "None".to_string();
    }

    let mut sorted = hours.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<String> = Vec::new();
    let mut start = sorted[0];
    let mut end = sorted[0];

    let mut push_range = |start: u32, end: u32| {
        if start == end {
            ranges.push(format!("{:02}:00", start));
        } else {
            ranges.push(format!("{:02}:00-{:02}:00", start, end));
        }
    };

    for &hour in &sorted[1..] {
        if hour == end + 1 {
            end = hour;
        } else {
            push_range(start, end);
            start = hour;
            end = hour;
        }
    }
    push_range(start, end);

    ranges.join(", ")
}
