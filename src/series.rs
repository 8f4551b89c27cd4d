//! Lenient extraction of performance points from stored series data.
//!
//! Series arrive as serialized records (`[{"timestamp": .., "output": ..}, ..]`),
//! sometimes as a JSON document nested inside a string column. Records missing
//! either field, or holding a value that is not a finite number, are skipped
//! silently. Numeric strings (`"150"`) are accepted.

use log::debug;
use serde_json::Value;

use crate::PerformancePoint;

/// Points extracted from a raw series plus how many records were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSeries {
    pub points: Vec<PerformancePoint>,
    pub skipped: usize,
}

impl ExtractedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Extract valid points from a raw series value.
///
/// `None`, `null`, non-array values and unparseable strings yield an empty series.
pub fn extract_points(series: Option<&Value>) -> ExtractedSeries {
    match series {
        Some(Value::Array(records)) => extract_records(records),
        Some(Value::String(text)) => extract_points_from_str(text),
        _ => ExtractedSeries::default(),
    }
}

/// Extract valid points from a serialized JSON series.
pub fn extract_points_from_str(text: &str) -> ExtractedSeries {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(records)) => extract_records(&records),
        Ok(_) => ExtractedSeries::default(),
        Err(e) => {
            debug!("[Series] Unparseable series text: {}", e);
            ExtractedSeries::default()
        }
    }
}

fn extract_records(records: &[Value]) -> ExtractedSeries {
    let mut points = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        match record_to_point(record) {
            Some(point) => points.push(point),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(
            "[Series] Extracted {} points, skipped {} malformed records",
            points.len(),
            skipped
        );
    }

    ExtractedSeries { points, skipped }
}

fn record_to_point(record: &Value) -> Option<PerformancePoint> {
    let obj = record.as_object()?;
    let timestamp = numeric(obj.get("timestamp")?)?;
    let output = numeric(obj.get("output")?)?;
    Some(PerformancePoint::new(timestamp, output))
}

fn numeric(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
