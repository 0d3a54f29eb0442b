//! Descriptive statistics over the full dataset

use crate::error::{AnalysisError, Result};
use crate::record::{Dataset, Origin};
use crate::stats::Summary;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of participants from one department
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentCount {
    pub department: String,
    pub participants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveSummary {
    pub participant_count: usize,
    /// Teaching experience across participants (years)
    pub experience: Summary,
    /// Ordered by participant count descending, then name
    pub departments: Vec<DepartmentCount>,
    pub text_count: usize,
    pub ai_text_count: usize,
    pub human_text_count: usize,
    pub response_count: usize,
    pub classified_ai: usize,
    pub classified_human: usize,
    pub confidence: Summary,
    /// Response times converted to seconds
    pub response_time_secs: Summary,
}

/// Summarize demographics, text inventory, and response distributions
pub fn describe(dataset: &Dataset) -> Result<DescriptiveSummary> {
    let records = dataset.records();
    if records.is_empty() {
        return Err(AnalysisError::EmptyDataset);
    }

    let experience: Vec<f64> = dataset
        .participants()
        .values()
        .map(|p| p.experience_years)
        .collect();

    let mut by_department: BTreeMap<&str, usize> = BTreeMap::new();
    for profile in dataset.participants().values() {
        *by_department.entry(profile.department.as_str()).or_default() += 1;
    }
    let mut departments: Vec<DepartmentCount> = by_department
        .into_iter()
        .map(|(department, participants)| DepartmentCount {
            department: department.to_string(),
            participants,
        })
        .collect();
    // BTreeMap already yields names ascending; the stable sort keeps that for ties
    departments.sort_by(|a, b| b.participants.cmp(&a.participants));

    let texts_of = |origin: Origin| {
        dataset
            .texts()
            .values()
            .filter(|t| t.origin == origin)
            .count()
    };
    let classified = |label: Origin| records.iter().filter(|r| r.classification == label).count();

    let confidence: Vec<f64> = records.iter().map(|r| f64::from(r.confidence)).collect();
    let response_times: Vec<f64> = records.iter().map(|r| r.response_time_secs()).collect();

    Ok(DescriptiveSummary {
        participant_count: dataset.participants().len(),
        experience: Summary::of(&experience).ok_or(AnalysisError::EmptyDataset)?,
        departments,
        text_count: dataset.texts().len(),
        ai_text_count: texts_of(Origin::Ai),
        human_text_count: texts_of(Origin::Human),
        response_count: records.len(),
        classified_ai: classified(Origin::Ai),
        classified_human: classified(Origin::Human),
        confidence: Summary::of(&confidence).ok_or(AnalysisError::EmptyDataset)?,
        response_time_secs: Summary::of(&response_times).ok_or(AnalysisError::EmptyDataset)?,
    })
}
