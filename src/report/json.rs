//! JSON report for machine parsing

use super::{ReportFormat, ReportRenderer, RunMetadata};
use crate::analysis::AnalysisReport;
use crate::error::{AnalysisError, Result};
use serde::Serialize;

#[derive(Serialize)]
struct JsonDocument<'a> {
    metadata: &'a RunMetadata,
    report: &'a AnalysisReport,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl ReportRenderer for JsonRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }

    fn render(&self, report: &AnalysisReport, meta: &RunMetadata) -> Result<String> {
        let document = JsonDocument {
            metadata: meta,
            report,
        };
        let mut json = serde_json::to_string_pretty(&document).map_err(|e| AnalysisError::Render {
            artifact: ReportFormat::Json.file_name(),
            message: e.to_string(),
        })?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use serde_json::Value;

    fn rendered() -> Value {
        let out = JsonRenderer
            .render(&fixtures::report(), &fixtures::metadata())
            .unwrap();
        serde_json::from_str(&out).unwrap()
    }

    #[test]
    fn test_json_document_shape() {
        let value = rendered();
        assert_eq!(value["metadata"]["source"], "responses.csv");
        assert_eq!(value["metadata"]["artifacts"][0], "accuracy/histogram.png");

        let report = &value["report"];
        assert_eq!(report["descriptive"]["participant_count"], 3);
        assert_eq!(report["accuracy"]["correct"], 8);
        assert_eq!(report["accuracy"]["total"], 12);
        assert_eq!(report["text_mapping"].as_array().unwrap().len(), 4);
        assert_eq!(report["difficulty"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_json_origins_are_lowercase() {
        let value = rendered();
        let origins: Vec<&str> = value["report"]["accuracy"]["by_origin"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["origin"].as_str().unwrap())
            .collect();
        assert_eq!(origins, vec!["ai", "human"]);
    }

    #[test]
    fn test_json_correlation_is_flattened() {
        let value = rendered();
        let first = &value["report"]["correlation"]["correlations"][0];
        assert!(first["r"].is_number());
        assert!(first["pvalue"].is_number());
        assert_eq!(first["n"], 3);
    }
}
