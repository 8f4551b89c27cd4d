//! One-shot workout summary: duration, output extremes, training load and zone minutes.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::distribution::parse_buckets;
use crate::error::OptionExt;
use crate::load::{estimate, LoadInput, LoadMethod};
use crate::series::extract_points;
use crate::zones::{bucket_series, is_zone_id, ZoneBuckets, ZoneTable};
use crate::{PerformancePoint, Reference, WorkoutKind};

/// Inputs for a summary. Scalars left as `None` are derived from `points`.
#[derive(Debug, Clone)]
pub struct SummaryInput<'a> {
    pub points: &'a [PerformancePoint],
    pub kind: WorkoutKind,
    pub reference: &'a Reference,
    pub zone_buckets: Option<&'a ZoneBuckets>,
    pub duration_seconds: Option<f64>,
    pub avg_output: Option<f64>,
    pub calories: Option<f64>,
}

impl<'a> SummaryInput<'a> {
    /// Summary input with everything derived from the series.
    pub fn from_series(
        points: &'a [PerformancePoint],
        kind: WorkoutKind,
        reference: &'a Reference,
    ) -> Self {
        Self {
            points,
            kind,
            reference,
            zone_buckets: None,
            duration_seconds: None,
            avg_output: None,
            calories: None,
        }
    }
}

/// Summary report for one workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub duration_seconds: f64,
    /// `"1h 5m"`, `"45m"`, `"0m"`
    pub duration_formatted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_output: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_output: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_factor: Option<f64>,
    pub load_method: LoadMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Minutes per visited zone, one decimal
    pub zone_minutes: BTreeMap<u8, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SummaryReport {
    fn degraded(message: String, calories: Option<f64>) -> Self {
        Self {
            duration_seconds: 0.0,
            duration_formatted: format_duration(0.0),
            min_output: None,
            avg_output: None,
            max_output: None,
            tss: None,
            intensity_factor: None,
            load_method: LoadMethod::None,
            calories,
            zone_minutes: BTreeMap::new(),
            message: Some(message),
        }
    }
}

/// Format seconds as `"<H>h <M>m"`, dropping the hour segment when zero.
///
/// Minutes are truncated; negative or non-finite input formats as `"0m"`.
///
/// # Example
/// ```
/// use workout_metrics::format_duration;
/// assert_eq!(format_duration(3600.0), "1h 0m");
/// assert_eq!(format_duration(2700.0), "45m");
/// assert_eq!(format_duration(0.0), "0m");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let total_minutes = if seconds.is_finite() && seconds > 0.0 {
        (seconds / 60.0).floor() as u64
    } else {
        0
    };
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

struct SeriesStats {
    duration_seconds: f64,
    min: f64,
    max: f64,
    mean: f64,
}

fn series_stats(points: &[PerformancePoint]) -> Option<SeriesStats> {
    let first = points.first()?;
    let last = points.last()?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    for p in points {
        min = min.min(p.output);
        max = max.max(p.output);
        sum += p.output;
    }

    Some(SeriesStats {
        duration_seconds: (last.timestamp - first.timestamp).max(0.0),
        min,
        max,
        mean: sum / points.len() as f64,
    })
}

fn minutes_by_zone(buckets: &ZoneBuckets) -> BTreeMap<u8, f64> {
    buckets
        .iter()
        .filter(|(zone, _)| is_zone_id(**zone))
        .map(|(zone, bucket)| (*zone, round1(bucket.effective_seconds() / 60.0)))
        .collect()
}

/// Build the summary report.
///
/// Load comes from the zone method when non-empty buckets are supplied,
/// otherwise from the direct method. Without supplied buckets, zone minutes
/// are derived from the series when the reference is usable.
pub fn build_summary(input: &SummaryInput<'_>) -> SummaryReport {
    let valid: Vec<PerformancePoint> = input
        .points
        .iter()
        .filter(|p| p.is_valid())
        .copied()
        .collect();
    let stats = series_stats(&valid);
    let reference = input.reference.resolve();
    let reference_error = reference
        .ok_or_unusable_reference(&format!("{} reference {:?}", input.kind, input.reference))
        .err();
    if let Some(e) = &reference_error {
        warn!("[Summary] {}, training load not computed", e);
    }

    let explicit_duration = input.duration_seconds.filter(|d| d.is_finite() && *d >= 0.0);
    let duration_seconds = explicit_duration
        .or(stats.as_ref().map(|s| s.duration_seconds))
        .unwrap_or(0.0);
    let avg_output = input
        .avg_output
        .filter(|a| a.is_finite())
        .or(stats.as_ref().map(|s| s.mean));

    // Zone path: summed zone time unless a duration was supplied
    let load_input = match LoadInput::resolve(
        input.zone_buckets,
        avg_output,
        Some(duration_seconds),
        reference,
    ) {
        LoadInput::FromZones {
            buckets, reference, ..
        } => LoadInput::FromZones {
            buckets,
            reference,
            duration_seconds: explicit_duration,
        },
        direct => direct,
    };
    let load = estimate(&load_input, input.kind);

    let zone_minutes = match (input.zone_buckets, reference) {
        (Some(buckets), _) => minutes_by_zone(buckets),
        (None, Some(_)) if valid.len() >= 2 => {
            let table = ZoneTable::standard(input.kind);
            minutes_by_zone(&bucket_series(&valid, &table, reference))
        }
        _ => BTreeMap::new(),
    };

    debug!(
        "[Summary] {} valid points, {:.0}s, load via {:?}",
        valid.len(),
        duration_seconds,
        load.method
    );

    SummaryReport {
        duration_seconds,
        duration_formatted: format_duration(duration_seconds),
        min_output: stats.as_ref().map(|s| s.min),
        avg_output: avg_output.map(round1),
        max_output: stats.as_ref().map(|s| s.max),
        tss: load.tss,
        intensity_factor: load.intensity_factor,
        load_method: load.method,
        calories: input.calories,
        zone_minutes,
        message: reference_error.map(|e| e.to_string()),
    }
}

/// Build the summary from raw stored data and a kind string.
///
/// An unknown kind yields a zeroed report with a message; `calories` is
/// still passed through.
pub fn build_summary_json(
    series: Option<&Value>,
    kind: &str,
    reference: &Reference,
    zone_buckets: Option<&Value>,
    duration_seconds: Option<f64>,
    avg_output: Option<f64>,
    calories: Option<f64>,
) -> SummaryReport {
    let kind = match WorkoutKind::parse(kind) {
        Ok(kind) => kind,
        Err(e) => {
            warn!("[Summary] {}", e);
            return SummaryReport::degraded(e.to_string(), calories);
        }
    };

    let extracted = extract_points(series);
    let buckets = zone_buckets.map(|raw| parse_buckets(Some(raw)));

    build_summary(&SummaryInput {
        points: &extracted.points,
        kind,
        reference,
        zone_buckets: buckets.as_ref(),
        duration_seconds,
        avg_output,
        calories,
    })
}
