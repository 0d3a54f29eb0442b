//! Plain-text report, also used for console output

use super::{fmt_opt, ReportFormat, ReportRenderer, RunMetadata};
use crate::analysis::hypothesis::{CHANCE_LEVEL, SIGNIFICANCE_LEVEL};
use crate::analysis::{AnalysisReport, Covariate, Direction};
use crate::error::Result;
use crate::record::{Origin, TextProfile};
use crate::stats::Summary;
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Section banner: blank line, rule, title, rule
fn section(out: &mut String, title: &str) {
    let _ = write!(out, "\n{}\n{}\n{}\n", rule(), title, rule());
}

/// Render the text-ID-to-title mapping document
pub fn render_text_mapping(texts: &[TextProfile]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "TEXT ID TO TITLE MAPPING");
    let _ = writeln!(out, "{}", rule());
    out.push('\n');
    for text in texts {
        let _ = writeln!(out, "Text {}: {}", text.id, text.title);
    }
    out
}

fn spread(summary: &Summary, precision: usize) -> String {
    format!(
        "{:.*} (SD={})",
        precision,
        summary.mean,
        fmt_opt(summary.sd, precision)
    )
}

/// Plain-text renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer;

impl TextRenderer {
    fn header(out: &mut String, meta: &RunMetadata) {
        let _ = writeln!(out, "{}", rule());
        let _ = writeln!(out, "AI TEXT DETECTION STUDY - STATISTICAL ANALYSIS");
        let _ = writeln!(out, "{}", rule());
        let _ = writeln!(out, "\nAnalysis date: {}", meta.generated_at);
        let _ = writeln!(out, "Loading data from: {}", meta.source);
        let _ = writeln!(out, "Input SHA-256: {}", meta.input_sha256);
    }

    fn mapping(out: &mut String, report: &AnalysisReport) {
        out.push('\n');
        out.push_str(&render_text_mapping(&report.text_mapping));
    }

    fn descriptive(out: &mut String, report: &AnalysisReport) {
        let d = &report.descriptive;
        section(out, "DESCRIPTIVE STATISTICS");

        let _ = writeln!(out, "\nNumber of participants: {}", d.participant_count);
        let _ = writeln!(out, "\nParticipant demographics:");
        let _ = writeln!(
            out,
            "  Mean teaching experience: {} years",
            spread(&d.experience, 2)
        );
        let _ = writeln!(
            out,
            "  Range: {:.0} - {:.0} years",
            d.experience.min, d.experience.max
        );
        let _ = writeln!(out, "\nDepartments represented:");
        let width = d
            .departments
            .iter()
            .map(|c| c.department.chars().count())
            .max()
            .unwrap_or(0);
        for count in &d.departments {
            let _ = writeln!(
                out,
                "  {:<width$}  {}",
                count.department,
                count.participants,
                width = width
            );
        }

        let _ = writeln!(out, "\nTotal number of texts: {}", d.text_count);
        let _ = writeln!(out, "AI-generated texts: {}", d.ai_text_count);
        let _ = writeln!(out, "Human-written texts: {}", d.human_text_count);

        let _ = writeln!(out, "\nTotal responses collected: {}", d.response_count);
        let _ = writeln!(out, "\nClassifications:");
        let _ = writeln!(out, "  Classified as AI: {}", d.classified_ai);
        let _ = writeln!(out, "  Classified as Human: {}", d.classified_human);

        let c = &d.confidence;
        let _ = writeln!(out, "\nConfidence ratings:");
        let _ = writeln!(out, "  Mean: {}", spread(c, 2));
        let _ = writeln!(out, "  Median: {:.0}", c.median);
        let _ = writeln!(out, "  Range: {:.0} - {:.0}", c.min, c.max);

        let t = &d.response_time_secs;
        let _ = writeln!(out, "\nResponse times:");
        let _ = writeln!(
            out,
            "  Mean: {:.2} seconds (SD={})",
            t.mean,
            fmt_opt(t.sd, 2)
        );
        let _ = writeln!(out, "  Median: {:.2} seconds", t.median);
        let _ = writeln!(out, "  Range: {:.2} - {:.2} seconds", t.min, t.max);
    }

    fn accuracy(out: &mut String, report: &AnalysisReport) {
        let a = &report.accuracy;
        section(out, "ACCURACY ANALYSIS");

        let _ = writeln!(out, "\nOverall accuracy: {:.2}%", a.overall);
        let p = &a.participant_summary;
        let _ = writeln!(out, "\nAccuracy by participant:");
        let _ = writeln!(out, "  Mean: {:.2}% (SD={}%)", p.mean, fmt_opt(p.sd, 2));
        let _ = writeln!(out, "  Range: {:.2}% - {:.2}%", p.min, p.max);

        let _ = writeln!(out, "\nAccuracy by text origin:");
        for origin in &a.by_origin {
            let _ = writeln!(
                out,
                "  {}: {:.2}% ({}/{})",
                origin.origin.label(),
                origin.accuracy,
                origin.correct,
                origin.total
            );
        }

        let m = &a.confusion;
        let _ = writeln!(out, "\nConfusion Matrix:");
        let _ = writeln!(
            out,
            "  {:<22}{:>8}{:>8}{:>8}",
            "origin \\ classified", "ai", "human", "All"
        );
        for origin in Origin::ALL {
            let _ = writeln!(
                out,
                "  {:<22}{:>8}{:>8}{:>8}",
                origin.as_str(),
                m.count(origin, Origin::Ai),
                m.count(origin, Origin::Human),
                m.row_total(origin)
            );
        }
        let _ = writeln!(
            out,
            "  {:<22}{:>8}{:>8}{:>8}",
            "All",
            m.column_total(Origin::Ai),
            m.column_total(Origin::Human),
            m.total()
        );

        let _ = writeln!(out, "\nDiagnostic measures:");
        let _ = writeln!(
            out,
            "  Sensitivity (True Positive Rate): {:.2}%",
            a.sensitivity
        );
        let _ = writeln!(
            out,
            "  Specificity (True Negative Rate): {:.2}%",
            a.specificity
        );
    }

    fn hypothesis(out: &mut String, report: &AnalysisReport) {
        let h = &report.hypothesis;
        section(out, "HYPOTHESIS TESTING");

        let _ = writeln!(out, "\nH0: Accuracy = {:.0}% (chance level)", CHANCE_LEVEL);
        let _ = writeln!(out, "H1: Accuracy \u{2260} {:.0}%", CHANCE_LEVEL);
        let _ = writeln!(out, "\nOne-sample t-test:");
        let _ = writeln!(out, "  t({}) = {:.3}", h.test.df, h.test.statistic);
        let _ = writeln!(out, "  p-value = {:.4}", h.test.pvalue);
        let _ = writeln!(out, "  Mean accuracy: {:.2}%", h.mean);
        let _ = writeln!(out, "  95% CI: [{:.2}%, {:.2}%]", h.ci_lower, h.ci_upper);

        if h.reject_null {
            let _ = writeln!(out, "\n  Result: REJECT H0 (p < {})", SIGNIFICANCE_LEVEL);
            let verdict = match h.direction {
                Direction::WorseThanChance => "WORSE",
                _ => "BETTER",
            };
            let _ = writeln!(
                out,
                "  Conclusion: Participants performed significantly {} than chance.",
                verdict
            );
        } else {
            let _ = writeln!(
                out,
                "\n  Result: FAIL TO REJECT H0 (p \u{2265} {})",
                SIGNIFICANCE_LEVEL
            );
            let _ = writeln!(out, "  Conclusion: No significant difference from chance level.");
        }

        let _ = writeln!(out, "\n  Effect size (Cohen's d): {:.3}", h.cohens_d);
        let _ = writeln!(out, "  Interpretation: {} effect", h.effect);
    }

    fn correlation(out: &mut String, report: &AnalysisReport) {
        let c = &report.correlation;
        section(out, "CORRELATION ANALYSIS");

        for covariate in Covariate::ALL {
            if let Some(result) = c.correlation(covariate) {
                let _ = writeln!(out, "\nAccuracy vs. {}:", covariate.label());
                let _ = writeln!(out, "  Pearson r = {:.3}, p = {:.4}", result.r, result.pvalue);
            }
        }

        let cc = &c.confidence_by_correctness;
        let _ = writeln!(out, "\nConfidence by correctness:");
        let _ = writeln!(
            out,
            "  Correct responses: M = {:.2} (SD = {})",
            cc.correct.mean,
            fmt_opt(cc.correct.sd, 2)
        );
        let _ = writeln!(
            out,
            "  Incorrect responses: M = {:.2} (SD = {})",
            cc.incorrect.mean,
            fmt_opt(cc.incorrect.sd, 2)
        );
        let _ = writeln!(
            out,
            "  t-test: t({}) = {:.3}, p = {:.4}",
            cc.test.df, cc.test.statistic, cc.test.pvalue
        );
    }

    fn difficulty(out: &mut String, report: &AnalysisReport) {
        section(out, "TEXT DIFFICULTY ANALYSIS");

        let _ = writeln!(out, "\nTexts ranked by difficulty (lowest accuracy first):\n");
        let _ = writeln!(
            out,
            "  {:>4}  {:<10}{:<8}{:>10}{:>12}{:>20}",
            "Rank", "Text", "Origin", "Accuracy", "Confidence", "Response time (ms)"
        );
        for entry in &report.difficulty {
            let _ = writeln!(
                out,
                "  {:>4}  {:<10}{:<8}{:>10.1}{:>12.2}{:>20.2}",
                entry.rank,
                entry.text_id.as_str(),
                entry.origin.as_str(),
                entry.accuracy,
                entry.mean_confidence,
                entry.mean_response_time_ms
            );
        }
    }

    fn visualizations(out: &mut String, meta: &RunMetadata) {
        section(out, "GENERATING VISUALIZATIONS");
        if meta.artifacts.is_empty() {
            let _ = writeln!(out, "Chart rendering disabled.");
        }
        for artifact in &meta.artifacts {
            let _ = writeln!(out, "\u{2713} Saved: {}", artifact);
        }

        section(out, "ANALYSIS COMPLETE");
        let _ = writeln!(out, "\nAll results saved to: {}", meta.output_dir);
    }
}

impl ReportRenderer for TextRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }

    fn render(&self, report: &AnalysisReport, meta: &RunMetadata) -> Result<String> {
        let mut out = String::new();
        Self::header(&mut out, meta);
        Self::mapping(&mut out, report);
        Self::descriptive(&mut out, report);
        Self::accuracy(&mut out, report);
        Self::hypothesis(&mut out, report);
        Self::correlation(&mut out, report);
        Self::difficulty(&mut out, report);
        Self::visualizations(&mut out, meta);
        Ok(out)
    }
}
