//! # Workout Metrics
//!
//! Chart-data and training-load engine for workout output series.
//!
//! This library provides:
//! - Zone classification of power (FTP-relative) and pace (threshold-pace-relative) output
//! - Deterministic downsampling of long series for rendering
//! - Zone-annotated performance graphs with a type-complete legend
//! - Time-in-zone distributions ready for proportion charts
//! - Training Stress Score / Intensity Factor, estimated directly or from zone time
//! - A summary report composing all of the above
//!
//! Every entry point is a pure function. Malformed input never panics: it
//! yields an empty result carrying an explanatory `message`.
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel zone bucketing with rayon
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use workout_metrics::{build_performance_graph, MetricsConfig, Reference};
//!
//! let series = json!([
//!     {"timestamp": 0, "output": 100},
//!     {"timestamp": 30, "output": 150},
//!     {"timestamp": 60, "output": 200},
//! ]);
//!
//! let graph = build_performance_graph(
//!     Some(&series),
//!     "powerBased",
//!     &Reference::Value(280.0),
//!     &MetricsConfig::default(),
//! );
//! assert_eq!(graph.points.len(), 3);
//! assert_eq!(graph.max_value, Some(200.0));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{MetricsError, OptionExt, Result};

// Raw series extraction (lenient JSON parsing)
pub mod series;
pub use series::{extract_points, extract_points_from_str, ExtractedSeries};

// Zone tables, classification and time-in-zone bucketing
pub mod zones;
pub use zones::{
    bucket_series, classify, resolve_pace_level, ZoneBand, ZoneBucket, ZoneBuckets, ZoneTable,
    PACE_THRESHOLDS, POWER_THRESHOLDS,
};
#[cfg(feature = "parallel")]
pub use zones::bucket_series_parallel;

// Deterministic downsampling
pub mod downsample;
pub use downsample::{reduce, reduce_indices, DEFAULT_TARGET_POINTS};

// Zone-annotated performance graph
pub mod graph;
pub use graph::{build_graph_from_points, build_performance_graph, AnnotatedPoint, GraphResult};

// Time-in-zone distribution
pub mod distribution;
pub use distribution::{
    build_zone_distribution, build_zone_distribution_json, DistributionEntry, DistributionResult,
};

// Training load (TSS / IF)
pub mod load;
pub use load::{estimate, LoadEstimate, LoadInput, LoadMethod};

// Workout summary report
pub mod summary;
pub use summary::{build_summary, build_summary_json, format_duration, SummaryInput, SummaryReport};

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("WorkoutMetricsRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A single output sample of a workout.
///
/// # Example
/// ```
/// use workout_metrics::PerformancePoint;
/// let point = PerformancePoint::new(30.0, 210.0); // 210 W at t=30s
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformancePoint {
    /// Seconds from workout start, or epoch seconds
    pub timestamp: f64,
    /// Watts for power-based workouts, pace units for pace-based workouts
    pub output: f64,
}

impl PerformancePoint {
    /// Create a new performance point.
    pub fn new(timestamp: f64, output: f64) -> Self {
        Self { timestamp, output }
    }

    /// Check that both fields are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.timestamp.is_finite() && self.output.is_finite()
    }
}

/// Kind of workout, which selects the zone table and the meaning of the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkoutKind {
    /// Output is power in watts, reference is FTP
    PowerBased,
    /// Output is pace (time per distance), reference is a threshold pace
    PaceBased,
}

impl WorkoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutKind::PowerBased => "powerBased",
            WorkoutKind::PaceBased => "paceBased",
        }
    }

    /// Parse a kind coming from an untyped source.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.parse()
    }
}

impl FromStr for WorkoutKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "powerBased" | "power_based" => Ok(WorkoutKind::PowerBased),
            "paceBased" | "pace_based" => Ok(WorkoutKind::PaceBased),
            _ => Err(MetricsError::InvalidWorkoutKind { raw: s.to_string() }),
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Threshold reference a workout is measured against.
///
/// Serialized untagged: a JSON number is a `Value`, a string is a named
/// pace `Level`, and `null` is `Missing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Reference {
    /// FTP in watts, or threshold pace in the workout's pace unit
    Value(f64),
    /// Named pace level such as `"level_5"`
    Level(String),
    #[default]
    Missing,
}

impl Reference {
    /// Resolve to a usable positive scalar.
    ///
    /// Returns `None` for missing, non-finite, non-positive or unknown-level references.
    pub fn resolve(&self) -> Option<f64> {
        match self {
            Reference::Value(v) if v.is_finite() && *v > 0.0 => Some(*v),
            Reference::Value(_) => None,
            Reference::Level(name) => resolve_pace_level(name),
            Reference::Missing => None,
        }
    }
}

impl From<f64> for Reference {
    fn from(value: f64) -> Self {
        Reference::Value(value)
    }
}

impl From<Option<f64>> for Reference {
    fn from(value: Option<f64>) -> Self {
        value.map(Reference::Value).unwrap_or_default()
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for chart-data generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsConfig {
    /// Maximum points in a rendered graph. `None` disables downsampling.
    /// Default: 120
    pub target_points: Option<usize>,

    /// Upper ratio bounds of power zones 1-6 (fraction of FTP).
    /// Default: Coggan 0.55 / 0.75 / 0.90 / 1.05 / 1.20 / 1.50
    pub power_thresholds: [f64; 6],

    /// Upper ratio bounds of pace zones 1-6 (fraction of threshold speed).
    /// Default: 0.78 / 0.88 / 0.94 / 1.01 / 1.06 / 1.12
    pub pace_thresholds: [f64; 6],
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            target_points: Some(DEFAULT_TARGET_POINTS),
            power_thresholds: POWER_THRESHOLDS,
            pace_thresholds: PACE_THRESHOLDS,
        }
    }
}

impl MetricsConfig {
    /// Default config with a different downsampling target.
    pub fn with_target_points(target_points: Option<usize>) -> Self {
        Self {
            target_points,
            ..Self::default()
        }
    }

    /// Zone table for a kind using this config's thresholds.
    ///
    /// Fails with `MetricsError::Config` when the thresholds are not
    /// finite, positive and strictly ascending.
    pub fn zone_table(&self, kind: WorkoutKind) -> Result<ZoneTable> {
        let thresholds = match kind {
            WorkoutKind::PowerBased => self.power_thresholds,
            WorkoutKind::PaceBased => self.pace_thresholds,
        };
        ZoneTable::with_thresholds(kind, thresholds)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_validation() {
        assert!(PerformancePoint::new(0.0, 150.0).is_valid());
        assert!(!PerformancePoint::new(f64::NAN, 150.0).is_valid());
        assert!(!PerformancePoint::new(0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_workout_kind_parse() {
        assert_eq!(WorkoutKind::parse("powerBased"), Ok(WorkoutKind::PowerBased));
        assert_eq!(WorkoutKind::parse("pace_based"), Ok(WorkoutKind::PaceBased));

        let err = WorkoutKind::parse("unknown_type").unwrap_err();
        assert!(err.to_string().contains("unknown_type"));
    }

    #[test]
    fn test_workout_kind_serde_names() {
        let json = serde_json::to_string(&WorkoutKind::PaceBased).unwrap();
        assert_eq!(json, "\"paceBased\"");
        assert_eq!(WorkoutKind::PowerBased.to_string(), "powerBased");
    }

    #[test]
    fn test_reference_resolve() {
        assert_eq!(Reference::Value(280.0).resolve(), Some(280.0));
        assert_eq!(Reference::Value(0.0).resolve(), None);
        assert_eq!(Reference::Value(-5.0).resolve(), None);
        assert_eq!(Reference::Value(f64::NAN).resolve(), None);
        assert_eq!(Reference::Missing.resolve(), None);
        assert_eq!(Reference::Level("no_such_level".into()).resolve(), None);
        assert!(Reference::Level("level_5".into()).resolve().is_some());
    }

    #[test]
    fn test_reference_untagged_json() {
        let r: Reference = serde_json::from_str("280").unwrap();
        assert_eq!(r, Reference::Value(280.0));
        let r: Reference = serde_json::from_str("\"level_3\"").unwrap();
        assert_eq!(r, Reference::Level("level_3".to_string()));
        let r: Reference = serde_json::from_str("null").unwrap();
        assert_eq!(r, Reference::Missing);
    }

    #[test]
    fn test_config_defaults() {
        let config = MetricsConfig::default();
        assert_eq!(config.target_points, Some(120));
        assert!(config.zone_table(WorkoutKind::PowerBased).is_ok());

        let partial: MetricsConfig = serde_json::from_str(r#"{"targetPoints": null}"#).unwrap();
        assert_eq!(partial.target_points, None);
        assert_eq!(partial.power_thresholds, POWER_THRESHOLDS);
    }

    #[test]
    fn test_config_rejects_bad_thresholds() {
        let config = MetricsConfig {
            power_thresholds: [0.55, 0.50, 0.90, 1.05, 1.20, 1.50],
            ..MetricsConfig::default()
        };
        assert!(matches!(
            config.zone_table(WorkoutKind::PowerBased),
            Err(MetricsError::Config { .. })
        ));
    }
}
