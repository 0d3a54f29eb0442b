//! Analysis run configuration
//!
//! Loaded from an optional TOML file and overridden by command-line flags.
//! Only presentation and output settings are configurable; the statistical
//! constants (chance level, α, z) are fixed in [`crate::analysis::hypothesis`].
//!
//! ```toml
//! format = "markdown"
//! output_root = "reports"
//!
//! [charts]
//! enabled = true
//! width = 1200
//! height = 800
//! accuracy_bins = 10
//! response_time_bins = 20
//! ```

use crate::error::{AnalysisError, Result};
use crate::report::ReportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Chart rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartConfig {
    /// Render PNG artifacts at all
    pub enabled: bool,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Bins of the participant accuracy histogram
    pub accuracy_bins: usize,

    /// Bins of the response time histogram
    pub response_time_bins: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 1200,
            height: 800,
            accuracy_bins: 10,
            response_time_bins: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Format of the persisted report document
    pub format: ReportFormat,

    /// Directory in which `analysis_<stem>_<timestamp>/` is created
    pub output_root: PathBuf,

    pub charts: ChartConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            output_root: PathBuf::from("."),
            charts: ChartConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| AnalysisError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let charts = &self.charts;
        if charts.width < 200 || charts.height < 150 {
            return Err(AnalysisError::Config(format!(
                "chart size must be at least 200x150, got {}x{}",
                charts.width, charts.height
            )));
        }

        if charts.accuracy_bins == 0 || charts.response_time_bins == 0 {
            return Err(AnalysisError::Config(
                "histogram bin counts must be positive".to_string(),
            ));
        }

        if self.output_root.as_os_str().is_empty() {
            return Err(AnalysisError::Config("output_root must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.format, ReportFormat::Text);
        assert_eq!(config.output_root, PathBuf::from("."));
        assert!(config.charts.enabled);
        assert_eq!(config.charts.accuracy_bins, 10);
        assert_eq!(config.charts.response_time_bins, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            format = "json"

            [charts]
            width = 800
            "#,
        )
        .unwrap();
        assert_eq!(config.format, ReportFormat::Json);
        assert_eq!(config.charts.width, 800);
        assert_eq!(config.charts.height, 800);
        assert!(config.charts.enabled);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = AnalysisConfig::from_toml_str("alpha = 0.01").unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_bins() {
        let mut config = AnalysisConfig::default();
        config.charts.accuracy_bins = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_chart_size() {
        let mut config = AnalysisConfig::default();
        config.charts.width = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/verifai.toml")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }
}
