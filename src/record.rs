//! Trial record loading
//!
//! Parses the study export (one CSV row per judged trial, participant and
//! text fields denormalized into each row) into typed [`TrialRecord`]s and
//! builds the participant and text profiles, checking that every row of a
//! participant or text agrees on its profile fields.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Columns every input file must carry
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "participant__id",
    "participant__experience",
    "participant__department",
    "text__id",
    "text__title",
    "text__origin",
    "classification",
    "confidence",
    "response_time",
];

const PRESENTATION_INDEX_COLUMN: &str = "presentation_index";

/// Source of a text, and the label a participant assigns to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Ai,
    Human,
}

impl Origin {
    pub const ALL: [Origin; 2] = [Origin::Ai, Origin::Human];

    /// Lowercase wire name (`ai` / `human`)
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Ai => "ai",
            Origin::Human => "human",
        }
    }

    /// Human-readable label used in reports and charts
    pub fn label(self) -> &'static str {
        match self {
            Origin::Ai => "AI-generated",
            Origin::Human => "Human-written",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" => Ok(Origin::Ai),
            "human" => Ok(Origin::Human),
            other => Err(format!("expected 'ai' or 'human', got '{}'", other)),
        }
    }
}

/// Participant or text identifier
///
/// Ordered numerically when both ids are unsigned integers, so `"9"` sorts
/// before `"10"`. Numeric ids sort before non-numeric ones; non-numeric ids
/// compare lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u128> {
        self.0.parse().ok()
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One participant's judgment of one text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant_id: ItemId,
    pub text_id: ItemId,
    pub text_title: String,
    pub text_origin: Origin,
    pub classification: Origin,
    /// Confidence rating, 1..=5
    pub confidence: u8,
    pub response_time_ms: u64,
    /// 1-based position of this trial in the participant's session
    pub presentation_index: u32,
    pub experience_years: f64,
    pub department: String,
}

impl TrialRecord {
    /// Whether the participant classified the text correctly
    pub fn correct(&self) -> bool {
        self.classification == self.text_origin
    }

    /// `correct` as 0/1
    pub fn correct_value(&self) -> u8 {
        u8::from(self.correct())
    }

    pub fn response_time_secs(&self) -> f64 {
        self.response_time_ms as f64 / 1000.0
    }
}

/// Demographics of one participant, shared by all of their trials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub id: ItemId,
    pub experience_years: f64,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Identity of one text stimulus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextProfile {
    pub id: ItemId,
    pub title: String,
    pub origin: Origin,
}

/// Loaded study data: trial records in file order plus derived profiles
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<TrialRecord>,
    participants: BTreeMap<ItemId, ParticipantProfile>,
    texts: BTreeMap<ItemId, TextProfile>,
}

impl Dataset {
    /// Build a dataset from records, validating profile consistency
    pub fn from_records(records: Vec<TrialRecord>) -> Result<Self> {
        let mut dataset = Dataset::default();
        for (i, record) in records.iter().enumerate() {
            dataset.register_profiles(record, None, i + 1)?;
        }
        dataset.records = records;
        Ok(dataset)
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn participants(&self) -> &BTreeMap<ItemId, ParticipantProfile> {
        &self.participants
    }

    pub fn texts(&self) -> &BTreeMap<ItemId, TextProfile> {
        &self.texts
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn register_profiles(
        &mut self,
        record: &TrialRecord,
        created_at: Option<String>,
        line: usize,
    ) -> Result<()> {
        match self.participants.get(&record.participant_id) {
            Some(profile) => {
                if profile.experience_years != record.experience_years
                    || profile.department != record.department
                {
                    return Err(AnalysisError::DataFormat(format!(
                        "line {}: participant {} has inconsistent profile fields \
                         (experience {} / department '{}' vs {} / '{}')",
                        line,
                        record.participant_id,
                        record.experience_years,
                        record.department,
                        profile.experience_years,
                        profile.department
                    )));
                }
            }
            None => {
                self.participants.insert(
                    record.participant_id.clone(),
                    ParticipantProfile {
                        id: record.participant_id.clone(),
                        experience_years: record.experience_years,
                        department: record.department.clone(),
                        created_at,
                    },
                );
            }
        }

        match self.texts.get(&record.text_id) {
            Some(text) => {
                if text.origin != record.text_origin || text.title != record.text_title {
                    return Err(AnalysisError::DataFormat(format!(
                        "line {}: text {} has inconsistent profile fields \
                         ('{}' / {} vs '{}' / {})",
                        line,
                        record.text_id,
                        record.text_title,
                        record.text_origin,
                        text.title,
                        text.origin
                    )));
                }
            }
            None => {
                self.texts.insert(
                    record.text_id.clone(),
                    TextProfile {
                        id: record.text_id.clone(),
                        title: record.text_title.clone(),
                        origin: record.text_origin,
                    },
                );
            }
        }
        Ok(())
    }
}

/// Load trial records from a CSV file
pub fn load_trials(path: &Path) -> Result<Dataset> {
    let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    let dataset = read_trials(file)?;
    debug!(
        "Loaded {} trials from {}",
        dataset.records.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse trial records from any CSV source
///
/// # Errors
/// * `DataFormat` for a missing column, malformed row, unparsable field,
///   unknown origin/classification, or an inconsistent profile
/// * `ValueRange` for confidence outside 1..=5, a negative response time,
///   or negative experience
pub fn read_trials<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AnalysisError::DataFormat(format!("cannot read header row: {}", e)))?;
    let headers = checked_headers(headers)?;

    let mut dataset = Dataset::default();
    let mut next_index: HashMap<ItemId, u32> = HashMap::new();

    for row in csv_reader.records() {
        let row = row.map_err(|e| AnalysisError::DataFormat(format!("malformed row: {}", e)))?;
        let line = row.position().map(|p| p.line() as usize).unwrap_or(0);
        let raw: CsvRow = row
            .deserialize(Some(&headers))
            .map_err(|e| AnalysisError::DataFormat(format!("line {}: {}", line, e)))?;

        let participant_id = ItemId::new(non_empty(raw.participant_id, "participant__id", line)?);
        let presentation_index = match raw.presentation_index.as_deref() {
            Some(value) => parse_number::<u32>(value, PRESENTATION_INDEX_COLUMN, line)?,
            None => {
                let counter = next_index.entry(participant_id.clone()).or_insert(0);
                *counter += 1;
                *counter
            }
        };

        let record = TrialRecord {
            participant_id,
            text_id: ItemId::new(non_empty(raw.text_id, "text__id", line)?),
            text_title: raw.text_title,
            text_origin: parse_origin(&raw.text_origin, "text__origin", line)?,
            classification: parse_origin(&raw.classification, "classification", line)?,
            confidence: parse_confidence(&raw.confidence, line)?,
            response_time_ms: parse_response_time(&raw.response_time, line)?,
            presentation_index,
            experience_years: parse_experience(&raw.experience, line)?,
            department: raw.department,
        };

        dataset.register_profiles(&record, raw.created_at, line)?;
        dataset.records.push(record);
    }

    Ok(dataset)
}

/// One CSV row as written by the study export
///
/// Fields stay textual here; range and enumeration checks happen while
/// building the [`TrialRecord`] so errors can name the line. Blank optional
/// fields deserialize to `None`, unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "participant__id")]
    participant_id: String,
    #[serde(rename = "participant__experience")]
    experience: String,
    #[serde(rename = "participant__department")]
    department: String,
    #[serde(rename = "text__id")]
    text_id: String,
    #[serde(rename = "text__title")]
    text_title: String,
    #[serde(rename = "text__origin")]
    text_origin: String,
    classification: String,
    confidence: String,
    response_time: String,
    #[serde(default)]
    presentation_index: Option<String>,
    #[serde(default, rename = "participant__created_at")]
    created_at: Option<String>,
}

/// Header row with any byte-order mark removed, after checking that every
/// required column is present
fn checked_headers(headers: &csv::StringRecord) -> Result<csv::StringRecord> {
    let headers: csv::StringRecord = headers
        .iter()
        .map(|name| name.trim_start_matches('\u{feff}'))
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == *c))
        .collect();
    if !missing.is_empty() {
        return Err(AnalysisError::DataFormat(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }
    Ok(headers)
}

fn non_empty(value: String, column: &str, line: usize) -> Result<String> {
    if value.is_empty() {
        return Err(AnalysisError::DataFormat(format!(
            "line {}: empty value in required column '{}'",
            line, column
        )));
    }
    Ok(value)
}

fn parse_origin(raw: &str, column: &str, line: usize) -> Result<Origin> {
    raw.parse().map_err(|e| {
        AnalysisError::DataFormat(format!("line {}: column '{}': {}", line, column, e))
    })
}

fn parse_number<T: FromStr>(raw: &str, field: &str, line: usize) -> Result<T> {
    raw.parse().map_err(|_| {
        AnalysisError::DataFormat(format!(
            "line {}: column '{}': '{}' is not a valid integer",
            line, field, raw
        ))
    })
}

fn parse_confidence(raw: &str, line: usize) -> Result<u8> {
    let value: i64 = parse_number(raw, "confidence", line)?;
    if !(1..=5).contains(&value) {
        return Err(AnalysisError::ValueRange {
            line,
            field: "confidence",
            value: raw.to_string(),
            expected: "integer in 1..=5",
        });
    }
    Ok(value as u8)
}

fn parse_response_time(raw: &str, line: usize) -> Result<u64> {
    let value: i64 = parse_number(raw, "response_time", line)?;
    if value < 0 {
        return Err(AnalysisError::ValueRange {
            line,
            field: "response_time",
            value: raw.to_string(),
            expected: "non-negative milliseconds",
        });
    }
    Ok(value as u64)
}

fn parse_experience(raw: &str, line: usize) -> Result<f64> {
    let value: f64 = raw.parse().map_err(|_| {
        AnalysisError::DataFormat(format!(
            "line {}: column 'participant__experience': '{}' is not a number",
            line, raw
        ))
    })?;
    if !value.is_finite() {
        return Err(AnalysisError::DataFormat(format!(
            "line {}: column 'participant__experience': '{}' is not finite",
            line, raw
        )));
    }
    if value < 0.0 {
        return Err(AnalysisError::ValueRange {
            line,
            field: "participant__experience",
            value: raw.to_string(),
            expected: "non-negative years",
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "participant__id,participant__experience,participant__department,\
text__id,text__title,text__origin,classification,confidence,response_time";

    fn csv_with(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_reads_valid_rows_in_file_order() {
        let input = csv_with(&[
            "1,5,Math,10,Essay A,ai,ai,4,12000",
            "1,5,Math,11,Essay B,human,ai,2,8000",
            "2,12,History,10,Essay A,ai,human,3,15000",
        ]);
        let dataset = read_trials(input.as_bytes()).unwrap();
        let records = dataset.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].text_id.as_str(), "10");
        assert!(records[0].correct());
        assert!(!records[1].correct());
        assert!(!records[2].correct());
        assert_eq!(records[1].presentation_index, 2);
        assert_eq!(records[2].presentation_index, 1);
        assert_eq!(dataset.participants().len(), 2);
        assert_eq!(dataset.texts().len(), 2);
    }

    #[test]
    fn test_quoted_title_with_comma() {
        let input = csv_with(&["1,5,Math,10,\"Rain, again\",human,human,5,1000"]);
        let dataset = read_trials(input.as_bytes()).unwrap();
        assert_eq!(dataset.records()[0].text_title, "Rain, again");
    }

    #[test]
    fn test_enumerations_are_case_insensitive() {
        let input = csv_with(&["1,5,Math,10,T,AI,Human,3,1000"]);
        let dataset = read_trials(input.as_bytes()).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.text_origin, Origin::Ai);
        assert_eq!(record.classification, Origin::Human);
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let input = "participant__id,text__id\n1,2";
        let err = read_trials(input.as_bytes()).unwrap_err();
        match err {
            AnalysisError::DataFormat(msg) => {
                assert!(msg.contains("confidence"));
                assert!(msg.contains("response_time"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_confidence_out_of_range() {
        let input = csv_with(&["1,5,Math,10,T,ai,ai,6,1000"]);
        let err = read_trials(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ValueRange {
                field: "confidence",
                line: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_confidence_zero_out_of_range() {
        let input = csv_with(&["1,5,Math,10,T,ai,ai,0,1000"]);
        assert!(matches!(
            read_trials(input.as_bytes()).unwrap_err(),
            AnalysisError::ValueRange { .. }
        ));
    }

    #[test]
    fn test_negative_response_time() {
        let input = csv_with(&["1,5,Math,10,T,ai,ai,3,-1"]);
        let err = read_trials(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ValueRange {
                field: "response_time",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_origin_is_format_error() {
        let input = csv_with(&["1,5,Math,10,T,robot,ai,3,100"]);
        assert!(matches!(
            read_trials(input.as_bytes()).unwrap_err(),
            AnalysisError::DataFormat(_)
        ));
    }

    #[test]
    fn test_non_integer_confidence_is_format_error() {
        let input = csv_with(&["1,5,Math,10,T,ai,ai,high,100"]);
        assert!(matches!(
            read_trials(input.as_bytes()).unwrap_err(),
            AnalysisError::DataFormat(_)
        ));
    }

    #[test]
    fn test_inconsistent_text_origin() {
        let input = csv_with(&["1,5,Math,10,T,ai,ai,3,100", "2,5,Math,10,T,human,ai,3,100"]);
        assert!(matches!(
            read_trials(input.as_bytes()).unwrap_err(),
            AnalysisError::DataFormat(_)
        ));
    }

    #[test]
    fn test_inconsistent_participant_profile() {
        let input = csv_with(&["1,5,Math,10,T,ai,ai,3,100", "1,6,Math,11,U,ai,ai,3,100"]);
        assert!(matches!(
            read_trials(input.as_bytes()).unwrap_err(),
            AnalysisError::DataFormat(_)
        ));
    }

    #[test]
    fn test_header_only_yields_empty_dataset() {
        let dataset = read_trials(HEADER.as_bytes()).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_optional_columns() {
        let input = "participant__id,participant__experience,participant__department,\
text__id,text__title,text__origin,classification,confidence,response_time,\
presentation_index,participant__created_at\n\
7,3,Art,1,T,ai,ai,3,100,4,2024-05-02T10:00:00\n";
        let dataset = read_trials(input.as_bytes()).unwrap();
        assert_eq!(dataset.records()[0].presentation_index, 4);
        let profile = &dataset.participants()[&ItemId::from("7")];
        assert_eq!(profile.created_at.as_deref(), Some("2024-05-02T10:00:00"));
    }

    #[test]
    fn test_columns_matched_by_name() {
        // Reordered columns, a byte-order mark, an unknown column, and a
        // blank optional field
        let input = "\u{feff}text__origin,participant__id,notes,classification,\
text__id,text__title,confidence,response_time,participant__experience,\
participant__department,presentation_index\n\
human,3,anything,ai,12,T,2,750,1.5,Bio,\n\
ai,3,,ai,13,U,4,250,1.5,Bio,\n";
        let dataset = read_trials(input.as_bytes()).unwrap();
        let first = &dataset.records()[0];
        assert_eq!(first.participant_id, ItemId::from("3"));
        assert_eq!(first.text_id, ItemId::from("12"));
        assert_eq!(first.text_origin, Origin::Human);
        assert!(!first.correct());
        assert_eq!(first.response_time_ms, 750);
        assert_eq!(first.experience_years, 1.5);
        assert_eq!(first.presentation_index, 1);
        assert_eq!(dataset.records()[1].presentation_index, 2);
        assert_eq!(dataset.participants()[&ItemId::from("3")].created_at, None);
    }

    #[test]
    fn test_empty_participant_id_is_format_error() {
        let input = csv_with(&[",5,Math,10,T,ai,ai,3,1000"]);
        match read_trials(input.as_bytes()).unwrap_err() {
            AnalysisError::DataFormat(msg) => {
                assert!(msg.contains("line 2"), "{msg}");
                assert!(msg.contains("participant__id"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_item_id_numeric_ordering() {
        let mut ids: Vec<ItemId> = ["10", "9", "b", "a", "100"]
            .into_iter()
            .map(ItemId::from)
            .collect();
        ids.sort();
        let ordered: Vec<&str> = ids.iter().map(ItemId::as_str).collect();
        assert_eq!(ordered, vec!["9", "10", "100", "a", "b"]);
    }

    #[test]
    fn test_from_records_checks_profiles() {
        let dataset = read_trials(csv_with(&["1,5,Math,10,T,ai,ai,3,100"]).as_bytes()).unwrap();
        let mut records = dataset.records().to_vec();
        let rebuilt = Dataset::from_records(records.clone()).unwrap();
        assert_eq!(rebuilt.records(), dataset.records());

        let mut conflicting = records[0].clone();
        conflicting.department = "History".to_string();
        records.push(conflicting);
        assert!(matches!(
            Dataset::from_records(records).unwrap_err(),
            AnalysisError::DataFormat(_)
        ));
    }

    #[test]
    fn test_load_trials_missing_file() {
        let err = load_trials(Path::new("/nonexistent/responses.csv")).unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }
}
