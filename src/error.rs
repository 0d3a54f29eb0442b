//! Error taxonomy for the analysis pipeline
//!
//! Every statistic that would be undefined for its input is rejected at the
//! boundary of the module computing it, so NaN/Inf never reaches a report.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by loading, analysis, and report emission
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed input: missing column, unparsable field, unknown enum value,
    /// or an inconsistent participant/text profile
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// A field parsed but lies outside its domain
    #[error("Value out of range on line {line}: {field} = {value} ({expected})")]
    ValueRange {
        line: usize,
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Dataset is empty: no trial records to analyze")]
    EmptyDataset,

    /// Statistic undefined for the available sample size
    #[error("Insufficient data for {statistic}: need at least {required}, got {actual}")]
    InsufficientData {
        statistic: &'static str,
        required: usize,
        actual: usize,
    },

    /// Zero-variance input where a finite statistic is required
    #[error("Degenerate input for {statistic}: {reason}")]
    DegenerateInput {
        statistic: &'static str,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to render {artifact}: {message}")]
    Render { artifact: String, message: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_range_message_names_line_and_field() {
        let err = AnalysisError::ValueRange {
            line: 7,
            field: "confidence",
            value: "9".to_string(),
            expected: "integer in 1..=5",
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("confidence = 9"));
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = AnalysisError::InsufficientData {
            statistic: "one-sample t-test",
            required: 2,
            actual: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data for one-sample t-test: need at least 2, got 1"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = AnalysisError::io(
            "missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("missing.csv"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
