//! Zone-annotated performance graph for chart widgets.
//!
//! Pipeline: validate kind, extract valid points, downsample, classify each
//! surviving point, then bound the values that will actually be drawn.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::downsample::reduce;
use crate::error::OptionExt;
use crate::series::extract_points;
use crate::zones::ZoneTable;
use crate::{MetricsConfig, MetricsError, PerformancePoint, Reference, Result, WorkoutKind};

/// Minimum valid points needed to draw a line.
const MIN_GRAPH_POINTS: usize = 2;

/// A rendered point with its zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPoint {
    pub timestamp: f64,
    pub value: f64,
    /// Zone id 1-7
    pub zone: u8,
}

/// Graph data for one workout.
///
/// `message` is only set on degraded results, in which case `points` is
/// empty and the value bounds are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphResult {
    pub points: Vec<AnnotatedPoint>,
    /// Labels for all seven zones of the workout kind
    pub zone_labels: BTreeMap<u8, String>,
    /// Hex colors for all seven zones of the workout kind
    pub zone_colors: BTreeMap<u8, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GraphResult {
    /// Empty result carrying an explanatory message.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether the result has drawable points.
    pub fn has_data(&self) -> bool {
        self.message.is_none() && !self.points.is_empty()
    }
}

/// Build a graph from a raw stored series.
///
/// Never fails: an unknown kind or too few valid points produce an empty
/// result with a message.
pub fn build_performance_graph(
    series: Option<&Value>,
    kind: &str,
    reference: &Reference,
    config: &MetricsConfig,
) -> GraphResult {
    let kind = match WorkoutKind::parse(kind) {
        Ok(kind) => kind,
        Err(e) => {
            warn!("[Graph] {}", e);
            return GraphResult::degraded(e.to_string());
        }
    };

    let extracted = extract_points(series);
    build_graph_from_points(&extracted.points, kind, reference, config)
}

/// Build a graph from already-validated points.
pub fn build_graph_from_points(
    points: &[PerformancePoint],
    kind: WorkoutKind,
    reference: &Reference,
    config: &MetricsConfig,
) -> GraphResult {
    let result = config
        .zone_table(kind)
        .and_then(|table| annotate(points, &table, reference, config.target_points));

    match result {
        Ok(graph) => graph,
        Err(e) => {
            let mut degraded = GraphResult::degraded(e.to_string());
            if !matches!(e, MetricsError::Config { .. }) {
                let table = ZoneTable::standard(kind);
                degraded.zone_labels = table.labels();
                degraded.zone_colors = table.colors();
            }
            degraded
        }
    }
}

fn annotate(
    points: &[PerformancePoint],
    table: &ZoneTable,
    reference: &Reference,
    target: Option<usize>,
) -> Result<GraphResult> {
    let valid: Vec<PerformancePoint> = points.iter().filter(|p| p.is_valid()).copied().collect();
    if valid.len() < MIN_GRAPH_POINTS {
        return Err(MetricsError::InsufficientData {
            point_count: valid.len(),
            minimum_required: MIN_GRAPH_POINTS,
        });
    }

    let resolved = reference.resolve();
    if resolved.is_none() {
        warn!(
            "[Graph] Unusable {} reference {:?}, all points shown in zone 1",
            table.kind, reference
        );
    }

    let reduced = reduce(&valid, target);
    debug!(
        "[Graph] Reduced {} points to {} (target {:?})",
        valid.len(),
        reduced.len(),
        target
    );

    let annotated: Vec<AnnotatedPoint> = reduced
        .iter()
        .map(|p| AnnotatedPoint {
            timestamp: p.timestamp,
            value: p.output,
            zone: table.classify(p.output, resolved),
        })
        .collect();

    let min_value = annotated
        .iter()
        .map(|p| p.value)
        .min_by(|a, b| a.total_cmp(b))
        .ok_or_insufficient_data(annotated.len(), MIN_GRAPH_POINTS)?;
    let max_value = annotated
        .iter()
        .map(|p| p.value)
        .max_by(|a, b| a.total_cmp(b))
        .ok_or_insufficient_data(annotated.len(), MIN_GRAPH_POINTS)?;

    Ok(GraphResult {
        points: annotated,
        zone_labels: table.labels(),
        zone_colors: table.colors(),
        min_value: Some(min_value),
        max_value: Some(max_value),
        message: None,
    })
}
