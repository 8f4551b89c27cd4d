//! Training Stress Score and Intensity Factor.
//!
//! Two estimation paths share one result shape:
//!
//! - **direct** - from average output, duration and reference. IF is
//!   `avg / reference` (inverted for pace). TSS uses an estimated normalized
//!   output, `avg * NORMALIZED_OUTPUT_FACTOR`, since interval workouts load
//!   the body more than their plain average suggests.
//! - **fromZones** - sums `minutes_in_zone * ZONE_LOAD_PER_MINUTE[zone]`, then
//!   back-derives IF from the TSS definition `TSS = hours * IF^2 * 100`.
//!
//! The zone path is preferred whenever a non-empty zone map is available
//! because it sees intensity variation inside the workout.
//!
//! ## Example
//! ```rust
//! use workout_metrics::{estimate, LoadInput, LoadMethod, WorkoutKind};
//!
//! let input = LoadInput::Direct {
//!     avg_output: Some(175.0),
//!     duration_seconds: Some(3600.0),
//!     reference: Some(280.0),
//! };
//! let load = estimate(&input, WorkoutKind::PowerBased);
//! assert_eq!(load.method, LoadMethod::Direct);
//! assert_eq!(load.intensity_factor, Some(0.625));
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

use crate::zones::{is_zone_id, ZoneBuckets};
use crate::WorkoutKind;

/// Estimated ratio of normalized output to average output for typical interval structure.
pub const NORMALIZED_OUTPUT_FACTOR: f64 = 1.14;

/// TSS accrued per minute in each zone (Z1..Z7).
///
/// Each weight is `IF^2 * 100 / 60` at a representative IF for the zone:
/// 0.50, 0.65, 0.83, 0.98, 1.13, 1.34, 1.60.
pub const ZONE_LOAD_PER_MINUTE: [f64; 7] = [0.42, 0.70, 1.15, 1.60, 2.13, 3.00, 4.27];

/// Converts `sqrt(tss / (minutes * 100))` back to an hourly IF: `1 / sqrt(60)`.
pub const REFERENCE_ADJUSTMENT: f64 = 0.129_099_444_873_580_56;

/// Which estimation path produced a load estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadMethod {
    Direct,
    FromZones,
    /// Neither path had enough input
    None,
}

/// Training load for one workout.
///
/// `tss`/`intensity_factor` are `None` when not computable, which is distinct
/// from a computed zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadEstimate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_factor: Option<f64>,
    pub method: LoadMethod,
}

impl LoadEstimate {
    fn not_computed(method: LoadMethod) -> Self {
        Self {
            tss: None,
            intensity_factor: None,
            method,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.tss.is_some()
    }
}

/// Inputs for one of the two estimation paths.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadInput<'a> {
    Direct {
        avg_output: Option<f64>,
        duration_seconds: Option<f64>,
        /// Resolved FTP or threshold pace
        reference: Option<f64>,
    },
    FromZones {
        buckets: &'a ZoneBuckets,
        /// Resolved FTP or threshold pace
        reference: Option<f64>,
        /// Overrides the summed zone time as the workout duration
        duration_seconds: Option<f64>,
    },
}

impl<'a> LoadInput<'a> {
    /// Pick the zone path when a non-empty zone map is available, else direct.
    pub fn resolve(
        buckets: Option<&'a ZoneBuckets>,
        avg_output: Option<f64>,
        duration_seconds: Option<f64>,
        reference: Option<f64>,
    ) -> Self {
        match buckets {
            Some(buckets) if buckets.keys().any(|z| is_zone_id(*z)) => LoadInput::FromZones {
                buckets,
                reference,
                duration_seconds,
            },
            _ => LoadInput::Direct {
                avg_output,
                duration_seconds,
                reference,
            },
        }
    }

    pub fn method(&self) -> LoadMethod {
        match self {
            LoadInput::Direct { .. } => LoadMethod::Direct,
            LoadInput::FromZones { .. } => LoadMethod::FromZones,
        }
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn direct(
    kind: WorkoutKind,
    avg_output: Option<f64>,
    duration_seconds: Option<f64>,
    reference: Option<f64>,
) -> Option<(f64, f64)> {
    let duration = positive(duration_seconds)?;
    let reference = positive(reference)?;

    // Zero watts is a real average; a zero pace has no speed to invert
    let intensity_factor = match kind {
        WorkoutKind::PowerBased => {
            let avg = avg_output.filter(|v| v.is_finite() && *v >= 0.0)?;
            avg / reference
        }
        WorkoutKind::PaceBased => reference / positive(avg_output)?,
    };
    let normalized_if = intensity_factor * NORMALIZED_OUTPUT_FACTOR;
    let hours = duration / 3600.0;
    let tss = hours * normalized_if * normalized_if * 100.0;

    Some((tss, intensity_factor))
}

fn from_zones(
    buckets: &ZoneBuckets,
    reference: Option<f64>,
    duration_seconds: Option<f64>,
) -> Option<(f64, f64)> {
    positive(reference)?;

    let mut tss = 0.0;
    let mut zone_seconds = 0.0;
    for (&zone, bucket) in buckets.iter().filter(|(z, _)| is_zone_id(**z)) {
        let secs = bucket.effective_seconds();
        zone_seconds += secs;
        tss += secs / 60.0 * ZONE_LOAD_PER_MINUTE[(zone - 1) as usize];
    }

    let minutes = positive(duration_seconds).unwrap_or(zone_seconds) / 60.0;
    if minutes <= 0.0 {
        return None;
    }
    let intensity_factor = (tss / (minutes * 100.0)).sqrt() / REFERENCE_ADJUSTMENT;

    Some((tss, intensity_factor))
}

/// Estimate training load.
///
/// Never fails: missing or unusable fields give `tss = None` with the method
/// of the attempted path.
pub fn estimate(input: &LoadInput<'_>, kind: WorkoutKind) -> LoadEstimate {
    let computed = match input {
        LoadInput::Direct {
            avg_output,
            duration_seconds,
            reference,
        } => direct(kind, *avg_output, *duration_seconds, *reference),
        LoadInput::FromZones {
            buckets,
            reference,
            duration_seconds,
        } => from_zones(buckets, *reference, *duration_seconds),
    };

    match computed {
        Some((tss, intensity_factor)) => {
            debug!(
                "[Load] {:?}: tss={:.1} if={:.3}",
                input.method(),
                tss,
                intensity_factor
            );
            LoadEstimate {
                tss: Some(round_to(tss, 1)),
                intensity_factor: Some(round_to(intensity_factor, 3)),
                method: input.method(),
            }
        }
        None => {
            debug!("[Load] {:?}: insufficient input", input.method());
            LoadEstimate::not_computed(input.method())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneBucket;

    fn bucket(secs: f64) -> ZoneBucket {
        ZoneBucket {
            samples: vec![],
            time_seconds: secs,
        }
    }

    #[test]
    fn test_direct_worked_example() {
        let input = LoadInput::Direct {
            avg_output: Some(175.0),
            duration_seconds: Some(3600.0),
            reference: Some(280.0),
        };
        let load = estimate(&input, WorkoutKind::PowerBased);

        assert_eq!(load.method, LoadMethod::Direct);
        assert_eq!(load.intensity_factor, Some(0.625));
        let tss = load.tss.unwrap();
        assert!(tss.is_finite() && tss > 0.0);
        assert!((tss - 51.0).abs() < 1.0);
    }

    #[test]
    fn test_direct_pace_inverts() {
        let input = LoadInput::Direct {
            avg_output: Some(10.0),
            duration_seconds: Some(1800.0),
            reference: Some(8.0),
        };
        let load = estimate(&input, WorkoutKind::PaceBased);
        assert_eq!(load.intensity_factor, Some(0.8));
    }

    #[test]
    fn test_from_zones() {
        let buckets = ZoneBuckets::from([(2, bucket(1800.0)), (4, bucket(1800.0))]);
        let input = LoadInput::resolve(Some(&buckets), Some(175.0), Some(3600.0), Some(280.0));
        assert_eq!(input.method(), LoadMethod::FromZones);

        let load = estimate(&input, WorkoutKind::PowerBased);
        // 30 * 0.70 + 30 * 1.60 = 69
        assert_eq!(load.tss, Some(69.0));
        assert_eq!(load.method, LoadMethod::FromZones);
        // sqrt(69 / 100) over one hour
        assert!((load.intensity_factor.unwrap() - 0.831).abs() < 0.001);
    }

    #[test]
    fn test_zone_weights_ascend() {
        assert!(ZONE_LOAD_PER_MINUTE.windows(2).all(|w| w[0] < w[1]));
        assert!((REFERENCE_ADJUSTMENT - 1.0 / 60f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_resolve_prefers_zones_only_when_non_empty() {
        let empty = ZoneBuckets::new();
        let input = LoadInput::resolve(Some(&empty), Some(175.0), Some(3600.0), Some(280.0));
        assert_eq!(input.method(), LoadMethod::Direct);

        let junk = ZoneBuckets::from([(0, bucket(60.0))]);
        let input = LoadInput::resolve(Some(&junk), None, None, Some(280.0));
        assert_eq!(input.method(), LoadMethod::Direct);
    }

    #[test]
    fn test_insufficient_input() {
        let missing_ref = LoadInput::Direct {
            avg_output: Some(175.0),
            duration_seconds: Some(3600.0),
            reference: Some(0.0),
        };
        let load = estimate(&missing_ref, WorkoutKind::PowerBased);
        assert_eq!(load.tss, None);
        assert_eq!(load.intensity_factor, None);
        assert_eq!(load.method, LoadMethod::Direct);
        assert!(!load.is_computed());

        let zero_duration = LoadInput::Direct {
            avg_output: Some(175.0),
            duration_seconds: Some(0.0),
            reference: Some(280.0),
        };
        assert_eq!(estimate(&zero_duration, WorkoutKind::PowerBased).tss, None);

        let buckets = ZoneBuckets::from([(3, bucket(0.0))]);
        let no_time = LoadInput::resolve(Some(&buckets), None, None, Some(280.0));
        let load = estimate(&no_time, WorkoutKind::PowerBased);
        assert_eq!(load.tss, None);
        assert_eq!(load.method, LoadMethod::FromZones);

        let no_ref = LoadInput::resolve(Some(&buckets), None, Some(600.0), None);
        assert_eq!(estimate(&no_ref, WorkoutKind::PowerBased).tss, None);
    }

    #[test]
    fn test_computed_zero_is_not_none() {
        let buckets = ZoneBuckets::from([(1, bucket(0.0))]);
        let input = LoadInput::resolve(Some(&buckets), None, Some(600.0), Some(280.0));
        let load = estimate(&input, WorkoutKind::PowerBased);
        assert_eq!(load.tss, Some(0.0));
        assert_eq!(load.intensity_factor, Some(0.0));
    }

    #[test]
    fn test_zero_power_average_is_computed() {
        let coasting = LoadInput::Direct {
            avg_output: Some(0.0),
            duration_seconds: Some(3600.0),
            reference: Some(280.0),
        };
        let load = estimate(&coasting, WorkoutKind::PowerBased);
        assert_eq!(load.tss, Some(0.0));
        assert_eq!(load.intensity_factor, Some(0.0));
        assert_eq!(load.method, LoadMethod::Direct);

        let stopped = LoadInput::Direct {
            avg_output: Some(0.0),
            duration_seconds: Some(3600.0),
            reference: Some(8.0),
        };
        assert_eq!(estimate(&stopped, WorkoutKind::PaceBased).tss, None);

        let negative = LoadInput::Direct {
            avg_output: Some(-5.0),
            duration_seconds: Some(3600.0),
            reference: Some(280.0),
        };
        assert_eq!(estimate(&negative, WorkoutKind::PowerBased).tss, None);
    }

    #[test]
    fn test_deterministic() {
        let input = LoadInput::Direct {
            avg_output: Some(213.7),
            duration_seconds: Some(4321.0),
            reference: Some(251.0),
        };
        let a = estimate(&input, WorkoutKind::PowerBased);
        let b = estimate(&input, WorkoutKind::PowerBased);
        assert_eq!(a.tss.map(f64::to_bits), b.tss.map(f64::to_bits));
        assert_eq!(a, b);
    }

    #[test]
    fn test_serialized_method_names() {
        let load = LoadEstimate::not_computed(LoadMethod::FromZones);
        let value = serde_json::to_value(load).unwrap();
        assert_eq!(value["method"], "fromZones");
        assert!(value.get("tss").is_none());
    }
}
