//! CLI argument parsing for Verifai

use crate::config::AnalysisConfig;
use crate::report::ReportFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "verifai")]
#[command(version)]
#[command(
    about = "Statistical analysis of AI-text detection study responses",
    long_about = None
)]
pub struct Cli {
    /// CSV file of trial responses
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Format of the persisted report (the console always shows text)
    #[arg(long = "format", value_enum)]
    pub format: Option<ReportFormat>,

    /// Directory in which the analysis directory is created
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip chart rendering
    #[arg(long = "no-charts")]
    pub no_charts: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(dir) = &self.output_dir {
            config.output_root = dir.clone();
        }
        if self.no_charts {
            config.charts.enabled = false;
        }
    }
}

/// Usage line printed when no input is given
pub fn usage() -> &'static str {
    "Usage: verifai <INPUT> [--format text|markdown|json] [--output-dir DIR] \
[--config FILE] [--no-charts] [--debug]"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_input() {
        let cli = Cli::parse_from(["verifai", "responses.csv"]);
        assert_eq!(cli.input, Some(PathBuf::from("responses.csv")));
        assert!(cli.format.is_none());
        assert!(!cli.no_charts);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_empty_without_input() {
        let cli = Cli::parse_from(["verifai"]);
        assert!(cli.input.is_none());
    }

    #[test]
    fn test_cli_format_flag() {
        let cli = Cli::parse_from(["verifai", "--format", "markdown", "data.csv"]);
        assert_eq!(cli.format, Some(ReportFormat::Markdown));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["verifai", "--format", "pdf", "data.csv"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "verifai",
            "--format",
            "json",
            "--output-dir",
            "reports",
            "--no-charts",
            "data.csv",
        ]);
        let mut config = AnalysisConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.format, ReportFormat::Json);
        assert_eq!(config.output_root, PathBuf::from("reports"));
        assert!(!config.charts.enabled);
    }

    #[test]
    fn test_cli_without_flags_keeps_config() {
        let cli = Cli::parse_from(["verifai", "data.csv"]);
        let mut config = AnalysisConfig::from_toml_str("format = \"markdown\"").unwrap();
        cli.apply(&mut config);
        assert_eq!(config.format, ReportFormat::Markdown);
        assert!(config.charts.enabled);
    }

    #[test]
    fn test_cli_debug_and_config_flags() {
        let cli = Cli::parse_from(["verifai", "--debug", "-c", "verifai.toml", "data.csv"]);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("verifai.toml")));
    }
}
