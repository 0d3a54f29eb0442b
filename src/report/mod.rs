//! Report rendering
//!
//! One report model ([`AnalysisReport`]) and pluggable renderers for the
//! persisted document: plain text (also printed to the console), Markdown,
//! and JSON. Run metadata (timestamp, source path, input digest, written
//! artifacts) is passed alongside the model so the model itself is
//! identical for identical input.

mod json;
mod markdown;
mod text;

pub use json::JsonRenderer;
pub use markdown::MarkdownRenderer;
pub use text::{render_text_mapping, TextRenderer};

use crate::analysis::AnalysisReport;
use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Report document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Plain text (default)
    Text,
    /// Markdown with tables
    Markdown,
    /// JSON for machine parsing
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }

    /// File name of the persisted report document
    pub fn file_name(self) -> String {
        format!("analysis_results.{}", self.extension())
    }

    pub fn renderer(self) -> Box<dyn ReportRenderer> {
        match self {
            ReportFormat::Text => Box::new(TextRenderer),
            ReportFormat::Markdown => Box::new(MarkdownRenderer),
            ReportFormat::Json => Box::new(JsonRenderer),
        }
    }
}

/// Facts about one run that are not part of the statistical result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunMetadata {
    /// Input path as given on the command line
    pub source: String,
    /// Hex SHA-256 of the input file
    pub input_sha256: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub generated_at: String,
    /// Final output directory
    pub output_dir: String,
    /// Chart artifacts relative to `output_dir`; empty when charts are disabled
    pub artifacts: Vec<String>,
}

/// Renders the report model into one document format
pub trait ReportRenderer {
    fn format(&self) -> ReportFormat;

    fn render(&self, report: &AnalysisReport, meta: &RunMetadata) -> Result<String>;
}

/// Shared number formatting
pub(crate) fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::analysis::{analyze, AnalysisReport};
    use crate::record::read_trials;

    use super::RunMetadata;

    pub const STUDY: &str = "participant__id,participant__experience,participant__department,\
text__id,text__title,text__origin,classification,confidence,response_time
1,4,Math,1,The Harbor,ai,ai,4,12000
1,4,Math,2,Letters Home,human,human,3,15000
1,4,Math,3,\"Rain, Again\",ai,human,2,22000
1,4,Math,4,Night Shift,human,human,5,9000
2,11,History,1,The Harbor,ai,ai,5,8000
2,11,History,2,Letters Home,human,ai,2,30000
2,11,History,3,\"Rain, Again\",ai,ai,4,14000
2,11,History,4,Night Shift,human,human,4,11000
3,2,English,1,The Harbor,ai,human,1,25000
3,2,English,2,Letters Home,human,human,3,18000
3,2,English,3,\"Rain, Again\",ai,ai,3,16000
3,2,English,4,Night Shift,human,ai,2,21000
";

    pub fn report() -> AnalysisReport {
        let dataset = read_trials(STUDY.as_bytes()).unwrap();
        analyze(&dataset).unwrap()
    }

    pub fn metadata() -> RunMetadata {
        RunMetadata {
            source: "responses.csv".to_string(),
            input_sha256: "00".repeat(32),
            generated_at: "2024-05-02 10:00:00".to_string(),
            output_dir: "analysis_responses_20240502_100000".to_string(),
            artifacts: vec!["accuracy/histogram.png".to_string()],
        }
    }
}
