//! Room history queries and their terminal presentation.

use airsense_core::HistoryEntry;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Aggregation interval of a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Minute,
    Hour,
    Day,
}

impl Interval {
    pub fn all() -> &'static [Interval] {
        &[Interval::Minute, Interval::Hour, Interval::Day]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Minute => "minute",
            Interval::Hour => "hour",
            Interval::Day => "day",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interval::Minute => "Minute",
            Interval::Hour => "Hour",
            Interval::Day => "Day",
        }
    }

    /// Window shown by default at this resolution.
    pub fn window(&self) -> Duration {
        match self {
            Interval::Minute => Duration::hours(1),
            Interval::Hour => Duration::days(1),
            Interval::Day => Duration::days(30),
        }
    }

    pub fn next(&self) -> Interval {
        match self {
            Interval::Minute => Interval::Hour,
            Interval::Hour => Interval::Day,
            Interval::Day => Interval::Minute,
        }
    }
}

/// Query string of the history endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryQuery {
    pub interval: Interval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    /// The default window for `interval`, ending at `now`.
    pub fn ending_at(interval: Interval, now: DateTime<Utc>) -> Self {
        Self {
            interval,
            from: Some(now - interval.window()),
            to: Some(now),
        }
    }
}

/// Human label for a parameter key; unknown keys are shown as-is.
pub fn parameter_label(name: &str) -> &str {
    match name {
        "temperature" => "Temperature",
        "humidity" => "Humidity",
        "pressure" => "Pressure",
        "co2" => "CO₂",
        "device_speed" => "Ventilation Speed",
        other => other,
    }
}

/// `(timestamp, value)` points ordered by time, for a line chart.
pub fn to_series(entries: &[HistoryEntry]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = entries
        .iter()
        .map(|e| (e.timestamp as f64, e.value))
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

/// Averages of `width` consecutive runs of readings, scaled to `0..=100`.
///
/// A flat series maps to a constant mid-height bar.
pub fn sparkline_buckets(entries: &[HistoryEntry], width: usize) -> Vec<u64> {
    if entries.is_empty() || width == 0 {
        return Vec::new();
    }
    let series = to_series(entries);
    let per_bucket = series.len().div_ceil(width);
    let averages: Vec<f64> = series
        .chunks(per_bucket)
        .map(|chunk| chunk.iter().map(|(_, v)| v).sum::<f64>() / chunk.len() as f64)
        .collect();

    let min = averages.iter().copied().fold(f64::INFINITY, f64::min);
    let max = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    averages
        .iter()
        .map(|v| {
            if range <= f64::EPSILON {
                50
            } else {
                (((v - min) / range) * 100.0).round() as u64
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub latest: HistoryEntry,
}

pub fn summarize(entries: &[HistoryEntry]) -> Option<HistorySummary> {
    let latest = entries.iter().max_by_key(|e| e.timestamp)?.clone();
    let min = entries.iter().map(|e| e.value).fold(f64::INFINITY, f64::min);
    let max = entries.iter().map(|e| e.value).fold(f64::NEG_INFINITY, f64::max);
    let mean = entries.iter().map(|e| e.value).sum::<f64>() / entries.len() as f64;
    Some(HistorySummary {
        min,
        max,
        mean,
        latest,
    })
}
