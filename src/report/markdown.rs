//! Markdown report with tables

use super::{fmt_opt, ReportFormat, ReportRenderer, RunMetadata};
use crate::analysis::hypothesis::{CHANCE_LEVEL, SIGNIFICANCE_LEVEL};
use crate::analysis::{AnalysisReport, Covariate, Direction};
use crate::error::Result;
use crate::record::Origin;
use std::fmt::Write;

/// Escape characters that would break a table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl ReportRenderer for MarkdownRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Markdown
    }

    fn render(&self, report: &AnalysisReport, meta: &RunMetadata) -> Result<String> {
        let mut out = String::new();

        let _ = writeln!(out, "# AI Text Detection Study: Statistical Analysis\n");
        let _ = writeln!(out, "- **Analysis date:** {}", meta.generated_at);
        let _ = writeln!(out, "- **Data source:** `{}`", meta.source);
        let _ = writeln!(out, "- **Input SHA-256:** `{}`", meta.input_sha256);

        let _ = writeln!(out, "\n## Text ID to Title Mapping\n");
        let _ = writeln!(out, "| Text | Title |\n|---:|---|");
        for text in &report.text_mapping {
            let _ = writeln!(out, "| {} | {} |", cell(text.id.as_str()), cell(&text.title));
        }

        let d = &report.descriptive;
        let _ = writeln!(out, "\n## Descriptive Statistics\n");
        let _ = writeln!(out, "- Participants: **{}**", d.participant_count);
        let _ = writeln!(
            out,
            "- Teaching experience: M = {:.2} years (SD = {}), range {:.0}-{:.0}",
            d.experience.mean,
            fmt_opt(d.experience.sd, 2),
            d.experience.min,
            d.experience.max
        );
        let _ = writeln!(
            out,
            "- Texts: {} ({} AI-generated, {} human-written)",
            d.text_count, d.ai_text_count, d.human_text_count
        );
        let _ = writeln!(
            out,
            "- Responses: {} ({} classified as AI, {} as human)",
            d.response_count, d.classified_ai, d.classified_human
        );
        let _ = writeln!(out, "\n| Department | Participants |\n|---|---:|");
        for count in &d.departments {
            let _ = writeln!(out, "| {} | {} |", cell(&count.department), count.participants);
        }
        let _ = writeln!(out, "\n| Measure | Mean | SD | Median | Min | Max |");
        let _ = writeln!(out, "|---|---:|---:|---:|---:|---:|");
        for (name, s) in [
            ("Confidence (1-5)", &d.confidence),
            ("Response time (s)", &d.response_time_secs),
        ] {
            let _ = writeln!(
                out,
                "| {} | {:.2} | {} | {:.2} | {:.2} | {:.2} |",
                name,
                s.mean,
                fmt_opt(s.sd, 2),
                s.median,
                s.min,
                s.max
            );
        }

        let a = &report.accuracy;
        let _ = writeln!(out, "\n## Accuracy\n");
        let _ = writeln!(out, "- Overall accuracy: **{:.2}%**", a.overall);
        let _ = writeln!(
            out,
            "- Per participant: M = {:.2}% (SD = {}%), range {:.2}%-{:.2}%",
            a.participant_summary.mean,
            fmt_opt(a.participant_summary.sd, 2),
            a.participant_summary.min,
            a.participant_summary.max
        );
        for origin in &a.by_origin {
            let _ = writeln!(
                out,
                "- {}: {:.2}% ({}/{})",
                origin.origin.label(),
                origin.accuracy,
                origin.correct,
                origin.total
            );
        }
        let _ = writeln!(out, "- Sensitivity: {:.2}%", a.sensitivity);
        let _ = writeln!(out, "- Specificity: {:.2}%", a.specificity);

        let m = &a.confusion;
        let _ = writeln!(out, "\n| Origin \\ Classified | ai | human | All |");
        let _ = writeln!(out, "|---|---:|---:|---:|");
        for origin in Origin::ALL {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                origin,
                m.count(origin, Origin::Ai),
                m.count(origin, Origin::Human),
                m.row_total(origin)
            );
        }
        let _ = writeln!(
            out,
            "| All | {} | {} | {} |",
            m.column_total(Origin::Ai),
            m.column_total(Origin::Human),
            m.total()
        );

        let h = &report.hypothesis;
        let _ = writeln!(out, "\n## Hypothesis Test\n");
        let _ = writeln!(
            out,
            "H0: accuracy = {:.0}% (chance). One-sample t-test: t({}) = {:.3}, p = {:.4}.\n",
            CHANCE_LEVEL, h.test.df, h.test.statistic, h.test.pvalue
        );
        let _ = writeln!(
            out,
            "- Mean accuracy: {:.2}%, 95% CI [{:.2}%, {:.2}%]",
            h.mean, h.ci_lower, h.ci_upper
        );
        let conclusion = match (h.reject_null, h.direction) {
            (true, Direction::WorseThanChance) => "reject H0: significantly worse than chance",
            (true, _) => "reject H0: significantly better than chance",
            (false, _) => "fail to reject H0: no significant difference from chance",
        };
        let _ = writeln!(out, "- Result (α = {}): {}", SIGNIFICANCE_LEVEL, conclusion);
        let _ = writeln!(out, "- Cohen's d = {:.3} ({} effect)", h.cohens_d, h.effect);

        let c = &report.correlation;
        let _ = writeln!(out, "\n## Correlations\n");
        let _ = writeln!(out, "| Accuracy vs. | Pearson r | p | n |\n|---|---:|---:|---:|");
        for covariate in Covariate::ALL {
            if let Some(r) = c.correlation(covariate) {
                let _ = writeln!(
                    out,
                    "| {} | {:.3} | {:.4} | {} |",
                    covariate.label(),
                    r.r,
                    r.pvalue,
                    r.n
                );
            }
        }
        let cc = &c.confidence_by_correctness;
        let _ = writeln!(
            out,
            "\nConfidence by correctness: correct M = {:.2} (SD = {}), incorrect M = {:.2} (SD = {}); \
             t({}) = {:.3}, p = {:.4}",
            cc.correct.mean,
            fmt_opt(cc.correct.sd, 2),
            cc.incorrect.mean,
            fmt_opt(cc.incorrect.sd, 2),
            cc.test.df,
            cc.test.statistic,
            cc.test.pvalue
        );

        let _ = writeln!(out, "\n## Text Difficulty\n");
        let _ = writeln!(
            out,
            "| Rank | Text | Origin | Accuracy (%) | Confidence | Response time (ms) |"
        );
        let _ = writeln!(out, "|---:|---|---|---:|---:|---:|");
        for e in &report.difficulty {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {:.1} | {:.2} | {:.2} |",
                e.rank,
                cell(e.text_id.as_str()),
                e.origin,
                e.accuracy,
                e.mean_confidence,
                e.mean_response_time_ms
            );
        }

        let _ = writeln!(out, "\n## Visualizations\n");
        if meta.artifacts.is_empty() {
            let _ = writeln!(out, "Chart rendering disabled.");
        }
        for artifact in &meta.artifacts {
            let _ = writeln!(out, "- [{}]({})", artifact, artifact);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_markdown_sections() {
        let out = MarkdownRenderer
            .render(&fixtures::report(), &fixtures::metadata())
            .unwrap();
        assert!(out.starts_with("# AI Text Detection Study"));
        for heading in [
            "## Text ID to Title Mapping",
            "## Descriptive Statistics",
            "## Accuracy",
            "## Hypothesis Test",
            "## Correlations",
            "## Text Difficulty",
            "## Visualizations",
        ] {
            assert!(out.contains(heading), "missing {heading}");
        }
        assert!(out.contains("| All | "));
        assert!(out.contains("- [accuracy/histogram.png](accuracy/histogram.png)"));
    }

    #[test]
    fn test_cell_escapes_pipes() {
        assert_eq!(cell("a|b"), "a\\|b");
    }
}
