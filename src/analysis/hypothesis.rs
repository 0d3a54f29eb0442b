//! One-sample test of participant accuracy against chance
//!
//! H0: mean accuracy = 50%. The 95% interval uses the normal approximation
//! (mean ± 1.96 · SEM), not a t critical value.

use crate::error::Result;
use crate::stats::{self, TTest};
use serde::Serialize;
use std::fmt;

/// Accuracy expected from guessing between two classes (percent)
pub const CHANCE_LEVEL: f64 = 50.0;

/// Significance level α for rejecting H0
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// z multiplier for the 95% confidence interval
pub const CONFIDENCE_Z: f64 = 1.96;

/// Cohen's d magnitude bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    pub fn from_cohens_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            EffectMagnitude::Negligible
        } else if d < 0.5 {
            EffectMagnitude::Small
        } else if d < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        })
    }
}

/// Sign of (mean - chance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    BetterThanChance,
    WorseThanChance,
    AtChance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisTest {
    pub n: usize,
    pub mean: f64,
    pub sd: f64,
    pub test: TTest,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// p < α
    pub reject_null: bool,
    pub direction: Direction,
    pub cohens_d: f64,
    pub effect: EffectMagnitude,
}

/// Test a participant accuracy series (percent) against [`CHANCE_LEVEL`]
///
/// # Errors
/// * `InsufficientData` with fewer than two participants
/// * `DegenerateInput` if all accuracies are equal but not at chance
pub fn test_against_chance(series: &[f64]) -> Result<HypothesisTest> {
    let test = stats::one_sample_ttest(series, CHANCE_LEVEL)?;

    // one_sample_ttest guarantees n >= 2, so mean/sd/sem are defined
    let mean = stats::mean(series).unwrap_or(CHANCE_LEVEL);
    let sd = stats::std_dev(series).unwrap_or(0.0);
    let sem = stats::standard_error(series).unwrap_or(0.0);

    let deviation = mean - CHANCE_LEVEL;
    // sd == 0 only reaches here when mean == chance
    let cohens_d = if sd > 0.0 { deviation / sd } else { 0.0 };

    let direction = if deviation > 0.0 {
        Direction::BetterThanChance
    } else if deviation < 0.0 {
        Direction::WorseThanChance
    } else {
        Direction::AtChance
    };

    Ok(HypothesisTest {
        n: series.len(),
        mean,
        sd,
        ci_lower: mean - CONFIDENCE_Z * sem,
        ci_upper: mean + CONFIDENCE_Z * sem,
        reject_null: test.pvalue < SIGNIFICANCE_LEVEL,
        direction,
        cohens_d,
        effect: EffectMagnitude::from_cohens_d(cohens_d),
        test,
    })
}
