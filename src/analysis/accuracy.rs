//! Classification accuracy: overall, per participant, per origin, and the
//! confusion matrix with sensitivity/specificity (AI is the positive class).

use crate::aggregate::Aggregates;
use crate::error::{AnalysisError, Result};
use crate::record::{ItemId, Origin};
use crate::stats::Summary;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantAccuracy {
    pub participant_id: ItemId,
    /// Percent correct
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OriginAccuracy {
    pub origin: Origin,
    pub correct: u64,
    pub total: u64,
    pub accuracy: f64,
}

/// Counts of (actual origin, classification) pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub ai_as_ai: u64,
    pub ai_as_human: u64,
    pub human_as_ai: u64,
    pub human_as_human: u64,
}

impl ConfusionMatrix {
    pub fn count(&self, origin: Origin, label: Origin) -> u64 {
        match (origin, label) {
            (Origin::Ai, Origin::Ai) => self.ai_as_ai,
            (Origin::Ai, Origin::Human) => self.ai_as_human,
            (Origin::Human, Origin::Ai) => self.human_as_ai,
            (Origin::Human, Origin::Human) => self.human_as_human,
        }
    }

    /// Row margin: trials whose text has `origin`
    pub fn row_total(&self, origin: Origin) -> u64 {
        Origin::ALL.iter().map(|&l| self.count(origin, l)).sum()
    }

    /// Column margin: trials classified as `label`
    pub fn column_total(&self, label: Origin) -> u64 {
        Origin::ALL.iter().map(|&o| self.count(o, label)).sum()
    }

    pub fn total(&self) -> u64 {
        self.ai_as_ai + self.ai_as_human + self.human_as_ai + self.human_as_human
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyAnalysis {
    pub correct: u64,
    pub total: u64,
    /// Percent of all trials classified correctly
    pub overall: f64,
    /// Ordered by participant id
    pub participants: Vec<ParticipantAccuracy>,
    pub participant_summary: Summary,
    /// AI first, then human
    pub by_origin: Vec<OriginAccuracy>,
    pub confusion: ConfusionMatrix,
    /// P(classified AI | AI text), percent
    pub sensitivity: f64,
    /// P(classified human | human text), percent
    pub specificity: f64,
}

impl AccuracyAnalysis {
    /// Participant accuracies in percent, the input of the hypothesis test
    pub fn participant_series(&self) -> Vec<f64> {
        self.participants.iter().map(|p| p.accuracy).collect()
    }

    pub fn origin(&self, origin: Origin) -> Option<&OriginAccuracy> {
        self.by_origin.iter().find(|o| o.origin == origin)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    part as f64 / whole as f64 * 100.0
}

/// Compute all accuracy measures from the aggregated views
///
/// # Errors
/// * `EmptyDataset` if there are no trials
/// * `InsufficientData` if either origin has no trials (its accuracy,
///   sensitivity, or specificity would divide by zero)
pub fn analyze_accuracy(aggregates: &Aggregates) -> Result<AccuracyAnalysis> {
    let ai = aggregates.origin(Origin::Ai);
    let human = aggregates.origin(Origin::Human);

    let total = ai.trials + human.trials;
    if total == 0 || aggregates.participants.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }
    for origin in [&ai, &human] {
        if origin.trials == 0 {
            return Err(AnalysisError::InsufficientData {
                statistic: match origin.origin {
                    Origin::Ai => "accuracy on AI-generated texts",
                    Origin::Human => "accuracy on human-written texts",
                },
                required: 1,
                actual: 0,
            });
        }
    }

    let participants: Vec<ParticipantAccuracy> = aggregates
        .participants
        .values()
        .map(|p| ParticipantAccuracy {
            participant_id: p.participant_id.clone(),
            accuracy: p.accuracy(),
        })
        .collect();
    let series: Vec<f64> = participants.iter().map(|p| p.accuracy).collect();
    let participant_summary = Summary::of(&series).ok_or(AnalysisError::EmptyDataset)?;

    let by_origin = [ai, human]
        .iter()
        .map(|o| OriginAccuracy {
            origin: o.origin,
            correct: o.correct,
            total: o.trials,
            accuracy: percent(o.correct, o.trials),
        })
        .collect();

    let confusion = ConfusionMatrix {
        ai_as_ai: ai.classified_as(Origin::Ai),
        ai_as_human: ai.classified_as(Origin::Human),
        human_as_ai: human.classified_as(Origin::Ai),
        human_as_human: human.classified_as(Origin::Human),
    };

    let correct = ai.correct + human.correct;
    Ok(AccuracyAnalysis {
        correct,
        total,
        overall: percent(correct, total),
        participants,
        participant_summary,
        by_origin,
        sensitivity: percent(confusion.ai_as_ai, confusion.row_total(Origin::Ai)),
        specificity: percent(confusion.human_as_human, confusion.row_total(Origin::Human)),
        confusion,
    })
}
