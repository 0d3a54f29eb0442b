//! Verifai - Statistical analysis of AI-text detection studies
//!
//! This library loads trial-level responses from a perception study (judges
//! classifying texts as AI-generated or human-written), aggregates them per
//! participant, text, and origin, tests accuracy against chance, and emits a
//! deterministic report with chart artifacts.

pub mod aggregate;
pub mod analysis;
pub mod charts;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod record;
pub mod report;
pub mod stats;
