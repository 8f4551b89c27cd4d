//! Zone classification and time-in-zone bucketing for power and pace workouts.
//!
//! Both workout kinds use seven zones. A zone is chosen from an intensity ratio:
//! - power: `output / ftp`
//! - pace: `threshold_pace / output` (a lower pace number is faster, so the
//!   ratio is inverted to keep "higher ratio = harder")
//!
//! The ratio is compared against six ascending upper bounds; anything above
//! the last bound is zone 7.
//!
//! ## Example
//! ```rust
//! use workout_metrics::{classify, Reference, WorkoutKind};
//!
//! let zone = classify(150.0, WorkoutKind::PowerBased, &Reference::Value(280.0));
//! assert_eq!(zone, 1); // 54% of FTP
//! ```

use std::collections::{BTreeMap, HashMap};

use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{MetricsError, PerformancePoint, Reference, Result, WorkoutKind};

/// Number of zones for every workout kind.
pub const ZONE_COUNT: usize = 7;

/// Standard Coggan power zones as fractions of FTP [Z1 max .. Z6 max].
pub const POWER_THRESHOLDS: [f64; 6] = [0.55, 0.75, 0.90, 1.05, 1.20, 1.50];

/// Pace zones as fractions of threshold speed [Z1 max .. Z6 max].
pub const PACE_THRESHOLDS: [f64; 6] = [0.78, 0.88, 0.94, 1.01, 1.06, 1.12];

/// Display metadata for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoneBand {
    pub zone: u8,
    pub label: &'static str,
    /// Hex color for chart rendering
    pub color: &'static str,
}

static POWER_BANDS: [ZoneBand; ZONE_COUNT] = [
    ZoneBand { zone: 1, label: "Active Recovery", color: "#50B4E6" },
    ZoneBand { zone: 2, label: "Endurance", color: "#5AC85A" },
    ZoneBand { zone: 3, label: "Tempo", color: "#F0DC3C" },
    ZoneBand { zone: 4, label: "Threshold", color: "#FAA028" },
    ZoneBand { zone: 5, label: "VO2 Max", color: "#F0643C" },
    ZoneBand { zone: 6, label: "Anaerobic", color: "#DC3232" },
    ZoneBand { zone: 7, label: "Neuromuscular", color: "#A03CB4" },
];

static PACE_BANDS: [ZoneBand; ZONE_COUNT] = [
    ZoneBand { zone: 1, label: "Recovery", color: "#50B4E6" },
    ZoneBand { zone: 2, label: "Easy", color: "#5AC85A" },
    ZoneBand { zone: 3, label: "Moderate", color: "#F0DC3C" },
    ZoneBand { zone: 4, label: "Challenging", color: "#FAA028" },
    ZoneBand { zone: 5, label: "Hard", color: "#F0643C" },
    ZoneBand { zone: 6, label: "Very Hard", color: "#DC3232" },
    ZoneBand { zone: 7, label: "Max", color: "#A03CB4" },
];

/// Threshold pace (minutes per mile) for each named pace level.
static PACE_LEVELS: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    HashMap::from([
        ("level_1", 15.0),
        ("level_2", 13.5),
        ("level_3", 12.0),
        ("level_4", 11.0),
        ("level_5", 10.0),
        ("level_6", 9.0),
        ("level_7", 8.25),
        ("level_8", 7.5),
        ("level_9", 6.75),
        ("level_10", 6.0),
    ])
});

/// Look up the threshold pace of a named level.
///
/// Names are matched case-insensitively and `"Level 5"` / `"level-5"` are
/// accepted as spellings of `"level_5"`.
pub fn resolve_pace_level(name: &str) -> Option<f64> {
    let key: String = name
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    PACE_LEVELS.get(key.as_str()).copied()
}

/// Zone boundaries for one workout kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTable {
    pub kind: WorkoutKind,
    /// Upper ratio bounds for zones 1-6. Zone 7 is everything above.
    pub thresholds: [f64; 6],
}

impl ZoneTable {
    /// Standard table for a kind.
    pub fn standard(kind: WorkoutKind) -> Self {
        let thresholds = match kind {
            WorkoutKind::PowerBased => POWER_THRESHOLDS,
            WorkoutKind::PaceBased => PACE_THRESHOLDS,
        };
        Self { kind, thresholds }
    }

    /// Create a table with custom thresholds.
    pub fn with_thresholds(kind: WorkoutKind, thresholds: [f64; 6]) -> Result<Self> {
        let finite = thresholds.iter().all(|t| t.is_finite() && *t > 0.0);
        let ascending = thresholds.windows(2).all(|w| w[0] < w[1]);
        if !finite || !ascending {
            return Err(MetricsError::Config {
                message: format!(
                    "{} zone thresholds must be positive and strictly ascending: {:?}",
                    kind, thresholds
                ),
            });
        }
        Ok(Self { kind, thresholds })
    }

    /// Label and color for all seven zones.
    pub fn bands(&self) -> &'static [ZoneBand; ZONE_COUNT] {
        match self.kind {
            WorkoutKind::PowerBased => &POWER_BANDS,
            WorkoutKind::PaceBased => &PACE_BANDS,
        }
    }

    /// Band for a zone id, `None` outside 1-7.
    pub fn band(&self, zone: u8) -> Option<&'static ZoneBand> {
        if (1..=ZONE_COUNT as u8).contains(&zone) {
            Some(&self.bands()[(zone - 1) as usize])
        } else {
            None
        }
    }

    pub fn labels(&self) -> BTreeMap<u8, String> {
        self.bands()
            .iter()
            .map(|b| (b.zone, b.label.to_string()))
            .collect()
    }

    pub fn colors(&self) -> BTreeMap<u8, String> {
        self.bands()
            .iter()
            .map(|b| (b.zone, b.color.to_string()))
            .collect()
    }

    /// Zone (1-7) for an intensity ratio. A ratio on a boundary belongs to the lower zone.
    pub fn zone_for_ratio(&self, ratio: f64) -> u8 {
        for (i, &threshold) in self.thresholds.iter().enumerate() {
            if ratio <= threshold {
                return (i + 1) as u8;
            }
        }
        7 // Above Z6 max is Z7
    }

    /// Intensity ratio of an output against a resolved reference.
    ///
    /// `None` when the reference is unusable, or for a non-positive pace.
    pub fn ratio(&self, output: f64, reference: Option<f64>) -> Option<f64> {
        let reference = reference.filter(|r| r.is_finite() && *r > 0.0)?;
        if !output.is_finite() {
            return None;
        }
        match self.kind {
            WorkoutKind::PowerBased => Some(output / reference),
            WorkoutKind::PaceBased if output > 0.0 => Some(reference / output),
            WorkoutKind::PaceBased => None,
        }
    }

    /// Zone for an output value. Falls back to zone 1 when no ratio can be formed.
    pub fn classify(&self, output: f64, reference: Option<f64>) -> u8 {
        self.ratio(output, reference)
            .map(|r| self.zone_for_ratio(r))
            .unwrap_or(1)
    }
}

/// Classify one output value with the standard table for `kind`.
///
/// An unusable reference yields zone 1; callers decide how to surface that.
pub fn classify(output: f64, kind: WorkoutKind, reference: &Reference) -> u8 {
    ZoneTable::standard(kind).classify(output, reference.resolve())
}

/// Samples and time credited to one zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneBucket {
    pub samples: Vec<f64>,
    pub time_seconds: f64,
}

impl ZoneBucket {
    /// Time in the zone, treating negative or non-finite values as zero.
    pub fn effective_seconds(&self) -> f64 {
        if self.time_seconds.is_finite() && self.time_seconds > 0.0 {
            self.time_seconds
        } else {
            0.0
        }
    }
}

/// Sparse map of zone id to bucket. Missing zones had no time.
pub type ZoneBuckets = BTreeMap<u8, ZoneBucket>;

/// Whether a bucket key is a real zone id.
pub(crate) fn is_zone_id(zone: u8) -> bool {
    (1..=ZONE_COUNT as u8).contains(&zone)
}

/// Seconds each point is held for: the gap to the next point.
///
/// The last point is credited with the median gap (1s for a single point).
/// Backwards steps count as zero.
fn hold_times(points: &[PerformancePoint]) -> Vec<f64> {
    let mut gaps: Vec<f64> = points
        .windows(2)
        .map(|w| (w[1].timestamp - w[0].timestamp).max(0.0))
        .collect();

    let tail = if gaps.is_empty() {
        1.0
    } else {
        let mut sorted = gaps.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted[sorted.len() / 2]
    };
    if !points.is_empty() {
        gaps.push(tail);
    }
    gaps
}

fn accumulate(zoned: impl Iterator<Item = (u8, f64, f64)>) -> ZoneBuckets {
    let mut buckets = ZoneBuckets::new();
    for (zone, output, seconds) in zoned {
        let bucket = buckets.entry(zone).or_default();
        bucket.samples.push(output);
        bucket.time_seconds += seconds;
    }
    buckets
}

/// Build a time-in-zone map from a series.
///
/// # Arguments
/// * `points` - Valid points, timestamps non-decreasing
/// * `table` - Zone table for the workout kind
/// * `reference` - Resolved FTP or threshold pace
///
/// # Returns
/// Sparse bucket map; only zones that were visited appear
pub fn bucket_series(
    points: &[PerformancePoint],
    table: &ZoneTable,
    reference: Option<f64>,
) -> ZoneBuckets {
    if reference.is_none() && !points.is_empty() {
        warn!(
            "[Zones] No usable {} reference, {} points bucketed into zone 1",
            table.kind,
            points.len()
        );
    }
    let holds = hold_times(points);
    accumulate(
        points
            .iter()
            .zip(holds)
            .map(|(p, secs)| (table.classify(p.output, reference), p.output, secs)),
    )
}

/// Bucket a series using parallel classification.
/// More efficient for large datasets (> 10,000 samples); results are
/// identical to [`bucket_series`] because accumulation stays sequential.
#[cfg(feature = "parallel")]
pub fn bucket_series_parallel(
    points: &[PerformancePoint],
    table: &ZoneTable,
    reference: Option<f64>,
) -> ZoneBuckets {
    if points.len() < 10_000 {
        // Fall back to sequential for small datasets
        return bucket_series(points, table, reference);
    }

    let zones: Vec<u8> = points
        .par_iter()
        .map(|p| table.classify(p.output, reference))
        .collect();
    let holds = hold_times(points);

    accumulate(
        zones
            .into_iter()
            .zip(points)
            .zip(holds)
            .map(|((zone, p), secs)| (zone, p.output, secs)),
    )
}
