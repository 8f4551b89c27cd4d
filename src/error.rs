//! Unified error handling for the workout-metrics library.
//!
//! The public builders never hand these errors to callers. Each pipeline runs
//! internally as a `Result<_, MetricsError>` and an `Err` is folded into the
//! degraded result, with the error's `Display` text as the result `message`.

use std::fmt;

/// Unified error type for workout-metrics operations.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// Workout kind string is not one of the supported kinds
    InvalidWorkoutKind { raw: String },
    /// Series has too few usable points
    InsufficientData {
        point_count: usize,
        minimum_required: usize,
    },
    /// Reference (FTP or pace level) is missing, non-positive or unknown
    UnusableReference { message: String },
    /// Total duration is zero, so nothing can be proportioned
    ZeroDuration,
    /// Custom zone thresholds are not ascending or not finite
    Config { message: String },
    /// JSON input or output could not be (de)serialized
    Serialization { message: String },
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::InvalidWorkoutKind { raw } => {
                write!(f, "Invalid workout type: {}", raw)
            }
            MetricsError::InsufficientData { .. } => write!(f, "No valid data points found"),
            MetricsError::UnusableReference { message } => {
                write!(f, "Unusable reference: {}", message)
            }
            MetricsError::ZeroDuration => write!(f, "No time recorded in any zone"),
            MetricsError::Config { message } => write!(f, "Configuration error: {}", message),
            MetricsError::Serialization { message } => {
                write!(f, "Serialization error: {}", message)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

impl From<serde_json::Error> for MetricsError {
    fn from(err: serde_json::Error) -> Self {
        MetricsError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for workout-metrics operations.
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Extension trait for converting Option to MetricsError.
pub trait OptionExt<T> {
    /// Convert Option to Result with insufficient data error.
    fn ok_or_insufficient_data(self, point_count: usize, minimum: usize) -> Result<T>;

    /// Convert Option to Result with unusable reference error.
    fn ok_or_unusable_reference(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_data(self, point_count: usize, minimum: usize) -> Result<T> {
        self.ok_or(MetricsError::InsufficientData {
            point_count,
            minimum_required: minimum,
        })
    }

    fn ok_or_unusable_reference(self, message: &str) -> Result<T> {
        self.ok_or_else(|| MetricsError::UnusableReference {
            message: message.to_string(),
        })
    }
}
