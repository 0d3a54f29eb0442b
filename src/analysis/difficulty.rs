//! Text difficulty ranking (lowest accuracy first)

use crate::aggregate::{Aggregates, TextAggregate};
use crate::record::{ItemId, Origin, TextProfile};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyEntry {
    /// 1-based, hardest first
    pub rank: usize,
    pub text_id: ItemId,
    pub origin: Origin,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub trials: u64,
    /// Percent correct
    pub accuracy: f64,
    pub mean_confidence: f64,
    pub mean_response_time_ms: f64,
}

/// Order text aggregates by ascending accuracy, ties by text id then origin
pub fn rank_texts<'a, I>(texts: I) -> Vec<&'a TextAggregate>
where
    I: IntoIterator<Item = &'a TextAggregate>,
{
    let mut ranked: Vec<&TextAggregate> = texts.into_iter().collect();
    ranked.sort_by(|a, b| {
        a.mean_correct
            .total_cmp(&b.mean_correct)
            .then_with(|| a.text_id.cmp(&b.text_id))
            .then_with(|| a.origin.cmp(&b.origin))
    });
    ranked
}

/// Rank every (text, origin) group, attaching titles from the text profiles
pub fn rank_difficulty(
    aggregates: &Aggregates,
    profiles: &BTreeMap<ItemId, TextProfile>,
) -> Vec<DifficultyEntry> {
    rank_texts(aggregates.texts.values())
        .into_iter()
        .enumerate()
        .map(|(i, text)| DifficultyEntry {
            rank: i + 1,
            text_id: text.text_id.clone(),
            origin: text.origin,
            title: profiles
                .get(&text.text_id)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            trials: text.trials,
            accuracy: text.accuracy(),
            mean_confidence: text.mean_confidence,
            mean_response_time_ms: text.mean_response_time_ms,
        })
        .collect()
}
