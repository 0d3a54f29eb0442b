//! Statistical kernel shared by the analysis modules
//!
//! Parametric tests only: Student t-tests (one-sample and pooled two-sample)
//! and Pearson correlation. p-values come from the regularized incomplete
//! beta function in statrs, which gives exact boundary values (p = 1 when
//! t = 0, p = 0 when |r| = 1).
//!
//! All spreads use the sample (n-1) denominator.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use statrs::function::beta::beta_reg;

/// Result of a Student t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTest {
    /// t-statistic value
    pub statistic: f64,

    /// Degrees of freedom
    pub df: usize,

    /// Two-tailed p-value
    pub pvalue: f64,
}

/// Result of a Pearson correlation test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    /// Pearson correlation coefficient, clamped to [-1, 1]
    pub r: f64,

    /// Two-tailed p-value for H0: r = 0
    pub pvalue: f64,

    /// Number of paired observations
    pub n: usize,
}

/// Location and spread of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` below two observations
    pub sd: Option<f64>,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summarize a sample, `None` when it is empty
    ///
    /// Values are sorted before any floating-point fold, so the result does
    /// not depend on the order of `values`.
    pub fn of(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Some(Self {
            count: sorted.len(),
            mean: mean(&sorted)?,
            sd: std_dev(&sorted),
            median: quantile(&sorted, 0.5)?,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n-1 denominator), `None` below two observations
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation (n-1 denominator)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Standard error of the mean, s / sqrt(n)
pub fn standard_error(values: &[f64]) -> Option<f64> {
    std_dev(values).map(|sd| sd / (values.len() as f64).sqrt())
}

/// Quantile of sorted data using linear interpolation between closest ranks
///
/// `q` is in [0, 1]. Matches the R-7 definition, so the median of an even
/// sample is the midpoint of the two central values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }

    let index = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        Some(sorted[lower])
    } else {
        let weight = index - lower as f64;
        Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
    }
}

/// Two-tailed p-value of a Student t statistic
///
/// Uses P(|T| >= |t|) = I_{df/(df+t^2)}(df/2, 1/2).
pub fn student_t_pvalue(statistic: f64, df: usize) -> f64 {
    if df == 0 {
        return 1.0;
    }
    let df = df as f64;
    let x = df / (df + statistic * statistic);
    beta_reg(df / 2.0, 0.5, x.clamp(0.0, 1.0))
}

/// One-sample two-tailed t-test of `values` against the population mean `mu`
///
/// # Errors
/// * `InsufficientData` with fewer than two values
/// * `DegenerateInput` when every value is identical but differs from `mu`
///   (the statistic would be infinite)
pub fn one_sample_ttest(values: &[f64], mu: f64) -> Result<TTest> {
    let n = values.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            statistic: "one-sample t-test",
            required: 2,
            actual: n,
        });
    }

    let m = mean(values).unwrap_or(mu);
    let sd = std_dev(values).unwrap_or(0.0);
    let df = n - 1;

    if sd == 0.0 {
        if m == mu {
            return Ok(TTest {
                statistic: 0.0,
                df,
                pvalue: 1.0,
            });
        }
        return Err(AnalysisError::DegenerateInput {
            statistic: "one-sample t-test",
            reason: format!("all {} values equal {} (zero variance)", n, m),
        });
    }

    let statistic = (m - mu) / (sd / (n as f64).sqrt());
    Ok(TTest {
        statistic,
        df,
        pvalue: student_t_pvalue(statistic, df),
    })
}

/// Independent two-sample t-test with pooled (equal) variance, two-tailed
///
/// # Errors
/// * `InsufficientData` if either group has fewer than two values
/// * `DegenerateInput` if both groups have zero variance but different means
pub fn two_sample_ttest(a: &[f64], b: &[f64]) -> Result<TTest> {
    let smaller = a.len().min(b.len());
    if smaller < 2 {
        return Err(AnalysisError::InsufficientData {
            statistic: "two-sample t-test",
            required: 2,
            actual: smaller,
        });
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (m1, m2) = (mean(a).unwrap_or(0.0), mean(b).unwrap_or(0.0));
    let (v1, v2) = (variance(a).unwrap_or(0.0), variance(b).unwrap_or(0.0));
    let df = a.len() + b.len() - 2;

    let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df as f64;
    if pooled == 0.0 {
        if m1 == m2 {
            return Ok(TTest {
                statistic: 0.0,
                df,
                pvalue: 1.0,
            });
        }
        return Err(AnalysisError::DegenerateInput {
            statistic: "two-sample t-test",
            reason: format!("both groups are constant ({} vs {})", m1, m2),
        });
    }

    let statistic = (m1 - m2) / (pooled * (1.0 / n1 + 1.0 / n2)).sqrt();
    Ok(TTest {
        statistic,
        df,
        pvalue: student_t_pvalue(statistic, df),
    })
}

/// Centered sums of squares and cross-products for paired data
fn centered_moments(x: &[f64], y: &[f64]) -> Option<(f64, f64, f64)> {
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    Some((sxx, syy, sxy))
}

/// Pearson correlation with two-tailed p-value
///
/// With exactly two observations the p-value is 1 (no degrees of freedom).
///
/// # Errors
/// * `DataFormat` if the slices differ in length
/// * `InsufficientData` below two observations
/// * `DegenerateInput` if either variable is constant
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation> {
    if x.len() != y.len() {
        return Err(AnalysisError::DataFormat(format!(
            "correlation needs paired samples, got {} and {} values",
            x.len(),
            y.len()
        )));
    }
    let n = x.len();
    if n < 2 {
        return Err(AnalysisError::InsufficientData {
            statistic: "Pearson correlation",
            required: 2,
            actual: n,
        });
    }

    let (sxx, syy, sxy) = centered_moments(x, y).unwrap_or((0.0, 0.0, 0.0));
    if sxx == 0.0 || syy == 0.0 {
        return Err(AnalysisError::DegenerateInput {
            statistic: "Pearson correlation",
            reason: "one of the variables is constant".to_string(),
        });
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let df = n - 2;
    let pvalue = if df == 0 {
        1.0
    } else {
        let x = 1.0 - r * r;
        if x <= 0.0 {
            0.0
        } else {
            beta_reg(df as f64 / 2.0, 0.5, x.min(1.0))
        }
    };

    Ok(Correlation { r, pvalue, n })
}

/// Least-squares line `y = slope * x + intercept`, `None` when x is constant
pub fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (sxx, _, sxy) = centered_moments(x, y)?;
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean(y)? - slope * mean(x)?;
    Some((slope, intercept))
}
