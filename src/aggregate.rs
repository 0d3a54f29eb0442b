//! Derived views over the trial records
//!
//! Three views are built in one pass: per participant, per (text, origin),
//! and per origin. Every per-group total is accumulated as an integer and
//! groups live in ordered maps, so the result is independent of input row
//! order and bit-identical across runs.

use crate::error::{AnalysisError, Result};
use crate::record::{ItemId, Origin, TrialRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Integer running totals for one group of trials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Totals {
    trials: u64,
    correct: u64,
    confidence: u64,
    /// Wide enough for any count of `i64::MAX` response times
    response_time_ms: u128,
}

impl Totals {
    fn add(&mut self, record: &TrialRecord) {
        self.trials += 1;
        self.correct += u64::from(record.correct_value());
        self.confidence += u64::from(record.confidence);
        self.response_time_ms += u128::from(record.response_time_ms);
    }

    fn ratio(&self, sum: u64) -> f64 {
        sum as f64 / self.trials as f64
    }

    fn mean_response_time_ms(&self) -> f64 {
        self.response_time_ms as f64 / self.trials as f64
    }
}

/// Per-participant means
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantAggregate {
    pub participant_id: ItemId,
    pub trials: u64,
    pub correct: u64,
    /// Mean of `correct` (0..=1)
    pub mean_correct: f64,
    pub mean_confidence: f64,
    pub mean_response_time_ms: f64,
    /// Carried through from the profile, not averaged
    pub experience_years: f64,
}

impl ParticipantAggregate {
    /// Accuracy in percent
    pub fn accuracy(&self) -> f64 {
        self.mean_correct * 100.0
    }
}

/// Per-(text, origin) means
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAggregate {
    pub text_id: ItemId,
    pub origin: Origin,
    pub trials: u64,
    pub correct: u64,
    pub mean_correct: f64,
    pub mean_confidence: f64,
    pub mean_response_time_ms: f64,
}

impl TextAggregate {
    /// Accuracy in percent
    pub fn accuracy(&self) -> f64 {
        self.mean_correct * 100.0
    }
}

/// Per-origin counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OriginAggregate {
    pub origin: Origin,
    pub trials: u64,
    pub correct: u64,
    pub classified_ai: u64,
    pub classified_human: u64,
    pub confidence_sum: u64,
    pub response_time_sum_ms: u128,
}

impl OriginAggregate {
    fn new(origin: Origin) -> Self {
        Self {
            origin,
            trials: 0,
            correct: 0,
            classified_ai: 0,
            classified_human: 0,
            confidence_sum: 0,
            response_time_sum_ms: 0,
        }
    }

    /// Trials of this origin given `label`
    pub fn classified_as(&self, label: Origin) -> u64 {
        match label {
            Origin::Ai => self.classified_ai,
            Origin::Human => self.classified_human,
        }
    }
}

/// All derived views for one analysis run
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub participants: BTreeMap<ItemId, ParticipantAggregate>,
    pub texts: BTreeMap<(ItemId, Origin), TextAggregate>,
    /// Always holds both origins, with zero counts when absent from the data
    pub origins: BTreeMap<Origin, OriginAggregate>,
}

impl Aggregates {
    /// Build all views from the trial records
    ///
    /// # Errors
    /// `EmptyDataset` when `records` is empty
    pub fn build(records: &[TrialRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(AnalysisError::EmptyDataset);
        }

        let mut participant_totals: BTreeMap<ItemId, (Totals, f64)> = BTreeMap::new();
        let mut text_totals: BTreeMap<(ItemId, Origin), Totals> = BTreeMap::new();
        let mut origins: BTreeMap<Origin, OriginAggregate> = Origin::ALL
            .iter()
            .map(|&o| (o, OriginAggregate::new(o)))
            .collect();

        for record in records {
            participant_totals
                .entry(record.participant_id.clone())
                .or_insert((Totals::default(), record.experience_years))
                .0
                .add(record);

            text_totals
                .entry((record.text_id.clone(), record.text_origin))
                .or_default()
                .add(record);

            let origin = origins
                .entry(record.text_origin)
                .or_insert_with(|| OriginAggregate::new(record.text_origin));
            origin.trials += 1;
            origin.correct += u64::from(record.correct_value());
            match record.classification {
                Origin::Ai => origin.classified_ai += 1,
                Origin::Human => origin.classified_human += 1,
            }
            origin.confidence_sum += u64::from(record.confidence);
            origin.response_time_sum_ms += u128::from(record.response_time_ms);
        }

        let participants = participant_totals
            .into_iter()
            .map(|(id, (totals, experience_years))| {
                let aggregate = ParticipantAggregate {
                    participant_id: id.clone(),
                    trials: totals.trials,
                    correct: totals.correct,
                    mean_correct: totals.ratio(totals.correct),
                    mean_confidence: totals.ratio(totals.confidence),
                    mean_response_time_ms: totals.mean_response_time_ms(),
                    experience_years,
                };
                (id, aggregate)
            })
            .collect();

        let texts = text_totals
            .into_iter()
            .map(|((id, origin), totals)| {
                let aggregate = TextAggregate {
                    text_id: id.clone(),
                    origin,
                    trials: totals.trials,
                    correct: totals.correct,
                    mean_correct: totals.ratio(totals.correct),
                    mean_confidence: totals.ratio(totals.confidence),
                    mean_response_time_ms: totals.mean_response_time_ms(),
                };
                ((id, origin), aggregate)
            })
            .collect();

        let aggregates = Self {
            participants,
            texts,
            origins,
        };
        debug!(
            "Aggregated {} trials into {} participants and {} texts",
            records.len(),
            aggregates.participants.len(),
            aggregates.texts.len()
        );
        Ok(aggregates)
    }

    /// Participant accuracies (percent) ordered by participant id
    pub fn participant_accuracies(&self) -> Vec<f64> {
        self.participants
            .values()
            .map(ParticipantAggregate::accuracy)
            .collect()
    }

    pub fn origin(&self, origin: Origin) -> OriginAggregate {
        self.origins
            .get(&origin)
            .copied()
            .unwrap_or_else(|| OriginAggregate::new(origin))
    }
}
