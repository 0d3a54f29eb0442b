//! End-to-end tests of the analysis pipeline through the library API

use std::fs;
use std::path::Path;
use verifai::analysis::{self, analyze, Covariate, Direction};
use verifai::error::AnalysisError;
use verifai::record::{load_trials, read_trials, ItemId, Origin};
use verifai::report::{ReportFormat, RunMetadata};
use verifai::stats;

fn fixture_text() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/study_responses.csv");
    fs::read_to_string(path).unwrap()
}

fn metadata() -> RunMetadata {
    RunMetadata {
        source: "study_responses.csv".to_string(),
        input_sha256: "ab".repeat(32),
        generated_at: "2024-05-02 10:00:00".to_string(),
        output_dir: "analysis_study_responses_20240502_100000".to_string(),
        artifacts: Vec::new(),
    }
}

#[test]
fn test_fixture_headline_numbers() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/study_responses.csv");
    let dataset = load_trials(&path).unwrap();
    let report = analyze(&dataset).unwrap();

    assert_eq!(report.descriptive.participant_count, 6);
    assert_eq!(report.descriptive.text_count, 6);
    assert_eq!(report.descriptive.ai_text_count, 3);
    assert_eq!(report.descriptive.human_text_count, 3);
    assert_eq!(report.descriptive.response_count, 36);
    assert_eq!(report.accuracy.correct, 27);
    assert_eq!(report.accuracy.total, 36);
    assert!((report.accuracy.overall - 75.0).abs() < 1e-9);
    assert_eq!(report.hypothesis.test.df, 5);
    assert_eq!(report.hypothesis.direction, Direction::BetterThanChance);
    assert_eq!(report.difficulty.len(), 6);
    assert_eq!(report.correlation.correlations.len(), 3);

    let created_at = &dataset.participants()[&ItemId::from("1")].created_at;
    assert_eq!(created_at.as_deref(), Some("2024-03-01 09:00:00"));
}

#[test]
fn test_reports_are_reproducible() {
    let text = fixture_text();
    let meta = metadata();
    for format in [ReportFormat::Text, ReportFormat::Markdown, ReportFormat::Json] {
        let render = || {
            let dataset = read_trials(text.as_bytes()).unwrap();
            let report = analyze(&dataset).unwrap();
            format.renderer().render(&report, &meta).unwrap()
        };
        assert_eq!(render(), render());
    }
}

#[test]
fn test_row_order_does_not_change_report() {
    let text = fixture_text();
    let mut lines: Vec<&str> = text.lines().collect();
    let header = lines.remove(0);
    lines.reverse();
    let reversed = format!("{}\n{}\n", header, lines.join("\n"));

    let forward = analyze(&read_trials(text.as_bytes()).unwrap()).unwrap();
    let backward = analyze(&read_trials(reversed.as_bytes()).unwrap()).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn test_all_accuracies_at_chance() {
    let result = analysis::test_against_chance(&[50.0, 50.0]).unwrap();
    assert_eq!(result.test.statistic, 0.0);
    assert_eq!(result.test.pvalue, 1.0);
    assert!(!result.reject_null);
}

#[test]
fn test_perfect_linear_correlation() {
    let result = stats::pearson(&[60.0, 80.0], &[3.0, 5.0]).unwrap();
    assert_eq!(result.r, 1.0);
}

#[test]
fn test_difficulty_tie_break_by_text_id() {
    // A: 40%, B: 90%, C: 40% with C's id sorting before A's
    let header = "participant__id,participant__experience,participant__department,\
text__id,text__title,text__origin,classification,confidence,response_time\n";
    let mut csv = String::from(header);
    let plan = [("20", "ai", 4), ("30", "human", 9), ("10", "human", 4)];
    for participant in 1..=10 {
        for (text, origin, correct_count) in plan {
            let classification = if participant <= correct_count {
                origin
            } else if origin == "ai" {
                "human"
            } else {
                "ai"
            };
            csv.push_str(&format!(
                "{p},{p},Dept,{t},Title {t},{o},{c},{conf},{rt}\n",
                p = participant,
                t = text,
                o = origin,
                c = classification,
                conf = 1 + participant % 5,
                rt = 1000 * participant
            ));
        }
    }

    let dataset = read_trials(csv.as_bytes()).unwrap();
    let aggregates = verifai::aggregate::Aggregates::build(dataset.records()).unwrap();
    let ranked = analysis::rank_difficulty(&aggregates, dataset.texts());
    let order: Vec<&str> = ranked.iter().map(|e| e.text_id.as_str()).collect();
    assert_eq!(order, vec!["10", "20", "30"]);
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[0].origin, Origin::Human);
}

#[test]
fn test_constant_confidence_is_degenerate() {
    let header = "participant__id,participant__experience,participant__department,\
text__id,text__title,text__origin,classification,confidence,response_time\n";
    let csv = format!(
        "{}1,2,A,1,T1,ai,ai,3,1000\n1,2,A,2,T2,human,ai,3,2000\n\
2,5,B,1,T1,ai,ai,3,1500\n2,5,B,2,T2,human,human,3,2500\n\
3,9,C,1,T1,ai,human,3,1200\n3,9,C,2,T2,human,ai,3,900\n",
        header
    );
    let dataset = read_trials(csv.as_bytes()).unwrap();
    let err = analyze(&dataset).unwrap_err();
    assert!(matches!(err, AnalysisError::DegenerateInput { .. }), "{err}");
}

#[test]
fn test_correlation_labels_in_report_order() {
    let report = analyze(&read_trials(fixture_text().as_bytes()).unwrap()).unwrap();
    let covariates: Vec<Covariate> = report
        .correlation
        .correlations
        .iter()
        .map(|c| c.covariate)
        .collect();
    assert_eq!(covariates, Covariate::ALL.to_vec());
}
