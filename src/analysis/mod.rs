// Statistical analysis of perception-study responses
//
// Loader -> Aggregator -> {descriptive, accuracy, hypothesis, correlation,
// difficulty}. Every stage is a pure function of its inputs; the combined
// result is an `AnalysisReport` handed to the report emitter. Nothing here
// performs I/O.

pub mod accuracy;
pub mod correlation;
pub mod descriptive;
pub mod difficulty;
pub mod hypothesis;

pub use accuracy::{analyze_accuracy, AccuracyAnalysis, ConfusionMatrix, OriginAccuracy};
pub use correlation::{analyze_correlations, Covariate, CorrelationAnalysis};
pub use descriptive::{describe, DescriptiveSummary};
pub use difficulty::{rank_difficulty, DifficultyEntry};
pub use hypothesis::{test_against_chance, Direction, EffectMagnitude, HypothesisTest};

use crate::aggregate::Aggregates;
use crate::error::Result;
use crate::record::{Dataset, TextProfile};
use serde::Serialize;
use tracing::info;

/// Results of every analysis module, in report section order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Text id → title, ordered by id
    pub text_mapping: Vec<TextProfile>,
    pub descriptive: DescriptiveSummary,
    pub accuracy: AccuracyAnalysis,
    pub hypothesis: HypothesisTest,
    pub correlation: CorrelationAnalysis,
    pub difficulty: Vec<DifficultyEntry>,
}

/// Run the full analysis over a loaded dataset
///
/// Any undefined statistic aborts the run with the error of the module that
/// detected it; there is no partial report.
pub fn analyze(dataset: &Dataset) -> Result<AnalysisReport> {
    let aggregates = Aggregates::build(dataset.records())?;

    let descriptive = describe(dataset)?;
    info!(
        "Descriptive statistics: {} participants, {} responses",
        descriptive.participant_count, descriptive.response_count
    );

    let accuracy = analyze_accuracy(&aggregates)?;
    info!("Overall accuracy: {:.2}%", accuracy.overall);

    let hypothesis = test_against_chance(&accuracy.participant_series())?;
    info!(
        "Chance test: t({}) = {:.3}, p = {:.4}",
        hypothesis.test.df, hypothesis.test.statistic, hypothesis.test.pvalue
    );

    let correlation = analyze_correlations(&aggregates, dataset.records())?;
    let difficulty = rank_difficulty(&aggregates, dataset.texts());
    info!("Ranked {} texts by difficulty", difficulty.len());

    Ok(AnalysisReport {
        text_mapping: dataset.texts().values().cloned().collect(),
        descriptive,
        accuracy,
        hypothesis,
        correlation,
        difficulty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::record::read_trials;

    const HEADER: &str = "participant__id,participant__experience,participant__department,\
text__id,text__title,text__origin,classification,confidence,response_time\n";

    #[test]
    fn test_single_participant_fails_in_hypothesis_module() {
        let input = format!(
            "{}1,4,Math,1,A,ai,ai,5,1000\n1,4,Math,2,B,human,ai,2,2000\n1,4,Math,3,C,human,human,4,3000\n",
            HEADER
        );
        let dataset = read_trials(input.as_bytes()).unwrap();
        let err = analyze(&dataset).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                statistic: "one-sample t-test",
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = read_trials(HEADER.as_bytes()).unwrap();
        assert!(matches!(
            analyze(&dataset).unwrap_err(),
            AnalysisError::EmptyDataset
        ));
    }
}
