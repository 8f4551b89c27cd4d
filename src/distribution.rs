//! Time-in-zone distribution for proportion charts.
//!
//! Percentages are rounded to one decimal with a largest-remainder pass, so a
//! distribution over its own total always closes at exactly 100.0.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::zones::{is_zone_id, ZoneBucket, ZoneBuckets, ZoneTable};
use crate::{MetricsError, Result, WorkoutKind};

/// One row of the distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry {
    pub zone: u8,
    pub label: String,
    pub time_seconds: f64,
    pub time_minutes: f64,
    pub percentage: f64,
    pub color: String,
}

/// Distribution rows in ascending zone order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResult {
    pub entries: Vec<DistributionEntry>,
    pub total_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DistributionResult {
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn percentage_sum(&self) -> f64 {
        self.entries.iter().map(|e| e.percentage).sum()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Split `target_tenths` across `shares` (already in tenths of a percent).
///
/// Each share is floored, then the leftover tenths go to the largest
/// remainders; ties go to the lower zone. Shares must already be capped at
/// 1000 tenths.
fn apportion_tenths(shares: &[f64], target_tenths: i64) -> Vec<i64> {
    let mut tenths: Vec<i64> = shares.iter().map(|s| s.floor() as i64).collect();
    let assigned: i64 = tenths.iter().sum();
    let leftover = target_tenths.saturating_sub(assigned).max(0) as usize;

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = shares[a] - shares[a].floor();
        let rb = shares[b] - shares[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &i in order.iter().take(leftover) {
        tenths[i] += 1;
    }
    tenths
}

fn distribute(
    buckets: &ZoneBuckets,
    kind: WorkoutKind,
    total_duration_seconds: Option<f64>,
) -> Result<DistributionResult> {
    let present: Vec<(u8, f64)> = buckets
        .iter()
        .filter(|(zone, _)| is_zone_id(**zone))
        .map(|(zone, bucket)| (*zone, bucket.effective_seconds()))
        .collect();

    let zone_sum: f64 = present.iter().map(|(_, secs)| secs).sum();
    let total = total_duration_seconds.unwrap_or(zone_sum);
    if present.is_empty() || !total.is_finite() || total <= 0.0 {
        return Err(MetricsError::ZeroDuration);
    }

    // An explicit total shorter than the zone time caps each zone at 100%
    let shares: Vec<f64> = present
        .iter()
        .map(|(_, secs)| (1000.0 * secs / total).min(1000.0))
        .collect();
    let max_tenths = 1000.0 * present.len() as f64;
    let target_tenths = (1000.0 * zone_sum / total).min(max_tenths).round() as i64;
    let tenths = apportion_tenths(&shares, target_tenths);

    let table = ZoneTable::standard(kind);
    let entries = present
        .iter()
        .zip(tenths)
        .filter_map(|(&(zone, secs), t)| {
            let band = table.band(zone)?;
            Some(DistributionEntry {
                zone,
                label: band.label.to_string(),
                time_seconds: secs,
                time_minutes: round1(secs / 60.0),
                percentage: t as f64 / 10.0,
                color: band.color.to_string(),
            })
        })
        .collect::<Vec<_>>();

    debug!(
        "[Distribution] {} zones over {:.0}s",
        entries.len(),
        total
    );

    Ok(DistributionResult {
        entries,
        total_seconds: total,
        message: None,
    })
}

/// Build the distribution for a zone bucket map.
///
/// # Arguments
/// * `buckets` - Sparse zone map; keys outside 1-7 are ignored
/// * `kind` - Workout kind, selects labels and colors
/// * `total_duration_seconds` - Denominator; defaults to the summed zone time
///
/// # Returns
/// One entry per present zone, or an empty result with a message when there
/// is no time to proportion
pub fn build_zone_distribution(
    buckets: &ZoneBuckets,
    kind: WorkoutKind,
    total_duration_seconds: Option<f64>,
) -> DistributionResult {
    distribute(buckets, kind, total_duration_seconds)
        .unwrap_or_else(|e| DistributionResult::degraded(e.to_string()))
}

/// Build the distribution from a raw stored zone map and kind string.
pub fn build_zone_distribution_json(
    buckets: Option<&Value>,
    kind: &str,
    total_duration_seconds: Option<f64>,
) -> DistributionResult {
    let kind = match WorkoutKind::parse(kind) {
        Ok(kind) => kind,
        Err(e) => {
            warn!("[Distribution] {}", e);
            return DistributionResult::degraded(e.to_string());
        }
    };

    let buckets = parse_buckets(buckets);
    build_zone_distribution(&buckets, kind, total_duration_seconds)
}

/// Parse a stored zone map, dropping entries that are not valid buckets.
pub(crate) fn parse_buckets(raw: Option<&Value>) -> ZoneBuckets {
    let Some(Value::Object(map)) = raw else {
        return ZoneBuckets::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let zone = key.trim().parse::<u8>().ok()?;
            let bucket: ZoneBucket = serde_json::from_value(value.clone()).ok()?;
            Some((zone, bucket))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bucket(secs: f64) -> ZoneBucket {
        ZoneBucket {
            samples: vec![],
            time_seconds: secs,
        }
    }

    #[test]
    fn test_distribution_percentages() {
        let buckets = ZoneBuckets::from([(1, bucket(300.0)), (2, bucket(1200.0)), (3, bucket(900.0))]);
        let result = build_zone_distribution(&buckets, WorkoutKind::PowerBased, Some(2400.0));

        let percentages: Vec<f64> = result.entries.iter().map(|e| e.percentage).collect();
        assert_eq!(percentages, vec![12.5, 50.0, 37.5]);
        assert_eq!(result.percentage_sum(), 100.0);
        assert_eq!(result.entries[1].time_minutes, 20.0);
        assert_eq!(result.entries[0].label, "Active Recovery");
        assert_eq!(result.message, None);
    }

    #[test]
    fn test_percentage_closure_with_thirds() {
        let buckets = ZoneBuckets::from([
            (1, bucket(100.0)),
            (3, bucket(100.0)),
            (5, bucket(100.0)),
            (7, bucket(100.0)),
            (2, bucket(100.0)),
            (4, bucket(100.0)),
            (6, bucket(100.0)),
        ]);
        let result = build_zone_distribution(&buckets, WorkoutKind::PowerBased, None);
        assert!((result.percentage_sum() - 100.0).abs() <= 0.1);
        assert_eq!(result.entries.len(), 7);
    }

    #[test]
    fn test_sparse_and_ordered() {
        let buckets = ZoneBuckets::from([(6, bucket(60.0)), (2, bucket(180.0)), (9, bucket(500.0))]);
        let result = build_zone_distribution(&buckets, WorkoutKind::PaceBased, None);

        let zones: Vec<u8> = result.entries.iter().map(|e| e.zone).collect();
        assert_eq!(zones, vec![2, 6]);
        assert_eq!(result.total_seconds, 240.0);
        assert_eq!(result.entries[0].percentage, 75.0);
        assert_eq!(result.entries[1].label, "Very Hard");
    }

    #[test]
    fn test_zero_duration_is_degraded() {
        let empty = ZoneBuckets::new();
        let result = build_zone_distribution(&empty, WorkoutKind::PowerBased, None);
        assert!(result.entries.is_empty());
        assert!(result.message.is_some());

        let zeros = ZoneBuckets::from([(1, bucket(0.0)), (2, bucket(-5.0))]);
        let result = build_zone_distribution(&zeros, WorkoutKind::PowerBased, None);
        assert!(result.entries.is_empty());

        let result = build_zone_distribution(&zeros, WorkoutKind::PowerBased, Some(0.0));
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_explicit_total_larger_than_zone_time() {
        let buckets = ZoneBuckets::from([(2, bucket(600.0))]);
        let result = build_zone_distribution(&buckets, WorkoutKind::PowerBased, Some(1200.0));
        assert_eq!(result.entries[0].percentage, 50.0);
    }

    #[test]
    fn test_tiny_explicit_total_is_bounded() {
        let buckets = ZoneBuckets::from([(1, bucket(60.0)), (2, bucket(60.0))]);
        let result = build_zone_distribution(&buckets, WorkoutKind::PowerBased, Some(1e-300));

        assert_eq!(result.message, None);
        let percentages: Vec<f64> = result.entries.iter().map(|e| e.percentage).collect();
        assert_eq!(percentages, vec![100.0, 100.0]);

        let result = build_zone_distribution(&buckets, WorkoutKind::PowerBased, Some(60.0));
        assert!(result.entries.iter().all(|e| e.percentage <= 100.0));
    }

    #[test]
    fn test_json_entry_point() {
        let raw = json!({
            "1": {"timeSeconds": 300, "samples": [100, 110]},
            "2": {"timeSeconds": 1200},
            "x": {"timeSeconds": 10},
            "3": "garbage",
        });
        let result = build_zone_distribution_json(Some(&raw), "powerBased", None);
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].percentage, 20.0);

        let result = build_zone_distribution_json(Some(&raw), "rowing", None);
        assert_eq!(result.message.as_deref(), Some("Invalid workout type: rowing"));

        let result = build_zone_distribution_json(None, "powerBased", None);
        assert!(result.message.is_some());
    }

    #[test]
    fn test_apportion_tenths() {
        // 33.33.. each -> floors 333, one leftover tenth goes to the first
        let shares = vec![1000.0 / 3.0; 3];
        assert_eq!(apportion_tenths(&shares, 1000), vec![334, 333, 333]);
    }
}
