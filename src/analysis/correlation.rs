//! Associations between accuracy and participant-level covariates, and the
//! trial-level comparison of confidence for correct vs incorrect responses.

use crate::aggregate::Aggregates;
use crate::error::Result;
use crate::record::{ItemId, TrialRecord};
use crate::stats::{self, Correlation, TTest};
use serde::Serialize;

/// One row of the participant table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantRow {
    pub participant_id: ItemId,
    /// Percent correct
    pub accuracy: f64,
    pub mean_confidence: f64,
    pub mean_response_time_ms: f64,
    pub experience_years: f64,
}

/// Covariate correlated against accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Covariate {
    Confidence,
    ResponseTime,
    Experience,
}

impl Covariate {
    pub const ALL: [Covariate; 3] = [
        Covariate::Confidence,
        Covariate::ResponseTime,
        Covariate::Experience,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Covariate::Confidence => "Confidence",
            Covariate::ResponseTime => "Response Time",
            Covariate::Experience => "Teaching Experience",
        }
    }

    fn value(self, row: &ParticipantRow) -> f64 {
        match self {
            Covariate::Confidence => row.mean_confidence,
            Covariate::ResponseTime => row.mean_response_time_ms,
            Covariate::Experience => row.experience_years,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyCorrelation {
    pub covariate: Covariate,
    #[serde(flatten)]
    pub result: Correlation,
}

/// Mean and spread of one group of trial-level values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupStats {
    pub n: usize,
    pub mean: f64,
    pub sd: Option<f64>,
}

impl GroupStats {
    fn of(values: &[f64]) -> Self {
        Self {
            n: values.len(),
            mean: stats::mean(values).unwrap_or(0.0),
            sd: stats::std_dev(values),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceByCorrectness {
    pub correct: GroupStats,
    pub incorrect: GroupStats,
    /// Pooled-variance two-sample t-test, correct vs incorrect
    pub test: TTest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationAnalysis {
    /// Ordered by participant id
    pub participants: Vec<ParticipantRow>,
    /// In [`Covariate::ALL`] order
    pub correlations: Vec<AccuracyCorrelation>,
    pub confidence_by_correctness: ConfidenceByCorrectness,
}

impl CorrelationAnalysis {
    pub fn correlation(&self, covariate: Covariate) -> Option<&Correlation> {
        self.correlations
            .iter()
            .find(|c| c.covariate == covariate)
            .map(|c| &c.result)
    }
}

/// Build the participant table from the aggregates
pub fn participant_table(aggregates: &Aggregates) -> Vec<ParticipantRow> {
    aggregates
        .participants
        .values()
        .map(|p| ParticipantRow {
            participant_id: p.participant_id.clone(),
            accuracy: p.accuracy(),
            mean_confidence: p.mean_confidence,
            mean_response_time_ms: p.mean_response_time_ms,
            experience_years: p.experience_years,
        })
        .collect()
}

/// Pearson correlation of accuracy with one covariate across participants
///
/// # Errors
/// * `InsufficientData` with fewer than two participants
/// * `DegenerateInput` if accuracy or the covariate is constant
pub fn correlate(rows: &[ParticipantRow], covariate: Covariate) -> Result<AccuracyCorrelation> {
    let accuracy: Vec<f64> = rows.iter().map(|r| r.accuracy).collect();
    let values: Vec<f64> = rows.iter().map(|r| covariate.value(r)).collect();
    let result = stats::pearson(&accuracy, &values)?;
    Ok(AccuracyCorrelation { covariate, result })
}

/// Split trial confidence by correctness and compare the groups
///
/// Groups are sorted before testing so the result does not depend on the
/// order of `records`.
pub fn confidence_by_correctness(records: &[TrialRecord]) -> Result<ConfidenceByCorrectness> {
    let (mut correct, mut incorrect): (Vec<f64>, Vec<f64>) = (Vec::new(), Vec::new());
    for record in records {
        let value = f64::from(record.confidence);
        if record.correct() {
            correct.push(value);
        } else {
            incorrect.push(value);
        }
    }
    correct.sort_by(f64::total_cmp);
    incorrect.sort_by(f64::total_cmp);

    let test = stats::two_sample_ttest(&correct, &incorrect)?;
    Ok(ConfidenceByCorrectness {
        correct: GroupStats::of(&correct),
        incorrect: GroupStats::of(&incorrect),
        test,
    })
}

/// Run all correlation analyses
pub fn analyze_correlations(
    aggregates: &Aggregates,
    records: &[TrialRecord],
) -> Result<CorrelationAnalysis> {
    let participants = participant_table(aggregates);
    let correlations = Covariate::ALL
        .iter()
        .map(|&c| correlate(&participants, c))
        .collect::<Result<Vec<_>>>()?;

    Ok(CorrelationAnalysis {
        confidence_by_correctness: confidence_by_correctness(records)?,
        participants,
        correlations,
    })
}
