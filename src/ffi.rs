//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the chart-data engine
//! to Kotlin and Swift. All FFI functions are prefixed with `ffi_` to avoid
//! naming conflicts with the internal API. Inputs and outputs are JSON
//! strings so hosts can pass stored series straight through.

use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    build_performance_graph, build_summary_json, build_zone_distribution_json, estimate,
    init_logging, LoadInput, LoadMethod, MetricsConfig, MetricsError, Reference, WorkoutKind,
};
use crate::distribution::parse_buckets;

fn parse_value(json: &str) -> Option<Value> {
    serde_json::from_str(json).ok()
}

/// Unparseable references are treated as missing.
fn parse_reference(json: &str) -> Reference {
    serde_json::from_str(json).unwrap_or_default()
}

fn to_json<T: Serialize>(result: &T) -> String {
    serde_json::to_string(result).unwrap_or_else(|e| {
        warn!("[WorkoutMetricsRust] {}", MetricsError::from(e));
        "{}".to_string()
    })
}

/// Build a zone-annotated graph.
///
/// `reference_json` is a number (FTP / threshold pace), a level name string, or `null`.
/// `target_points` of `None` disables downsampling.
#[uniffi::export]
pub fn ffi_build_performance_graph(
    series_json: String,
    kind: String,
    reference_json: String,
    target_points: Option<u32>,
) -> String {
    init_logging();
    let series = parse_value(&series_json);
    let reference = parse_reference(&reference_json);
    let config = MetricsConfig::with_target_points(target_points.map(|t| t as usize));

    let result = build_performance_graph(series.as_ref(), &kind, &reference, &config);
    info!(
        "[WorkoutMetricsRust] Graph for {} with {} points",
        kind,
        result.points.len()
    );
    to_json(&result)
}

/// Build a time-in-zone distribution from a stored zone map.
#[uniffi::export]
pub fn ffi_build_zone_distribution(
    buckets_json: String,
    kind: String,
    total_duration_seconds: Option<f64>,
) -> String {
    init_logging();
    let buckets = parse_value(&buckets_json);
    let result = build_zone_distribution_json(buckets.as_ref(), &kind, total_duration_seconds);
    info!(
        "[WorkoutMetricsRust] Distribution for {} with {} zones",
        kind,
        result.entries.len()
    );
    to_json(&result)
}

/// Estimate training load, using the zone map when one is supplied.
#[uniffi::export]
pub fn ffi_estimate_training_load(
    kind: String,
    reference_json: String,
    buckets_json: Option<String>,
    avg_output: Option<f64>,
    duration_seconds: Option<f64>,
) -> String {
    init_logging();
    let kind = match WorkoutKind::parse(&kind) {
        Ok(kind) => kind,
        Err(e) => {
            warn!("[WorkoutMetricsRust] {}", e);
            return to_json(&json!({ "method": LoadMethod::None, "message": e.to_string() }));
        }
    };
    let reference = parse_reference(&reference_json).resolve();
    let buckets = buckets_json
        .as_deref()
        .map(|json| parse_buckets(parse_value(json).as_ref()));

    let input = LoadInput::resolve(buckets.as_ref(), avg_output, duration_seconds, reference);
    let result = estimate(&input, kind);
    info!(
        "[WorkoutMetricsRust] Load via {:?}: tss={:?}",
        result.method, result.tss
    );
    to_json(&result)
}

/// Build the full workout summary.
#[uniffi::export]
pub fn ffi_build_summary(
    series_json: String,
    kind: String,
    reference_json: String,
    buckets_json: Option<String>,
    duration_seconds: Option<f64>,
    avg_output: Option<f64>,
    calories: Option<f64>,
) -> String {
    init_logging();
    let series = parse_value(&series_json);
    let reference = parse_reference(&reference_json);
    let buckets = buckets_json.as_deref().and_then(parse_value);

    let result = build_summary_json(
        series.as_ref(),
        &kind,
        &reference,
        buckets.as_ref(),
        duration_seconds,
        avg_output,
        calories,
    );
    info!(
        "[WorkoutMetricsRust] Summary for {}: {}",
        kind, result.duration_formatted
    );
    to_json(&result)
}
