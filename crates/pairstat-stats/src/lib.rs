//! Paired statistical test engine.
//!
//! Compares two paired numeric samples (the same cases measured under two
//! studies) and produces a [`TestResult`]: a Shapiro-Wilk normality check on
//! the differences gates the choice between a paired t-test and a Wilcoxon
//! signed-rank test, each with its matching effect-size statistic and a
//! qualitative magnitude bucket.
//!
//! Insufficient data is never an error here: empty samples, all-zero
//! differences, and too-few observations all yield a result whose statistical
//! fields are `None`.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::cmp::Ordering;
use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Core types
// ═══════════════════════════════════════════════════════════════════════════════

/// Which paired test was selected by the normality gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChosenTest {
    #[serde(rename = "Paired t-test")]
    PairedT,
    #[serde(rename = "Wilcoxon signed-rank test")]
    Wilcoxon,
}

impl ChosenTest {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChosenTest::PairedT => "Paired t-test",
            ChosenTest::Wilcoxon => "Wilcoxon signed-rank test",
        }
    }
}

impl fmt::Display for ChosenTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Qualitative effect-size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectMagnitude {
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMagnitude::Small => "Small",
            EffectMagnitude::Medium => "Medium",
            EffectMagnitude::Large => "Large",
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary significance verdict. Only present when a p-value is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "Significant difference")]
    Significant,
    #[serde(rename = "No significant difference")]
    NotSignificant,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Significant => "Significant difference",
            Verdict::NotSignificant => "No significant difference",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for the engine: test significance and the normality gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestConfig {
    /// Significance level for the comparison verdict.
    pub alpha: f64,
    /// Shapiro-Wilk p-value above which the differences count as normal.
    pub normality_alpha: f64,
}

impl Default for TestConfig {
    fn default() -> Self {
        TestConfig {
            alpha: 0.05,
            normality_alpha: 0.05,
        }
    }
}

/// Result of one paired comparison. One output-table row.
///
/// `None` fields mean "insufficient data", not failure. The verdict is absent
/// whenever the p-value is absent.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub comparison: String,
    pub num_cases: usize,
    pub shapiro_p: Option<f64>,
    pub test_used: Option<ChosenTest>,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub effect_magnitude: Option<EffectMagnitude>,
    pub verdict: Option<Verdict>,
}

/// Header matching [`TestResult::csv_row`], column for column.
pub const CSV_HEADER: &str = "Comparison,Num Cases,Shapiro-Wilk test p-value,Test used,\
Comparison test p-value,Effect Size,Effect Size Interpretation,Result of comparison";

impl TestResult {
    /// A result with the label and case count filled in and every statistical
    /// field empty. Used for empty samples and degenerate difference vectors.
    pub fn insufficient(label: &str, num_cases: usize) -> TestResult {
        TestResult {
            comparison: label.to_string(),
            num_cases,
            shapiro_p: None,
            test_used: None,
            p_value: None,
            effect_size: None,
            effect_magnitude: None,
            verdict: None,
        }
    }

    /// Render as one CSV row. `None` fields become empty cells.
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            self.comparison,
            self.num_cases,
            fmt_opt_float(self.shapiro_p),
            self.test_used.map(|t| t.as_str()).unwrap_or(""),
            fmt_opt_float(self.p_value),
            fmt_opt_float(self.effect_size),
            self.effect_magnitude.map(|m| m.as_str()).unwrap_or(""),
            self.verdict.map(|v| v.as_str()).unwrap_or(""),
        )
    }
}

fn fmt_opt_float(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.6}"),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Shapiro-Wilk normality test (AS R94, Royston 1995)
// ═══════════════════════════════════════════════════════════════════════════════

/// Shapiro-Wilk statistic and p-value.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShapiroWilk {
    pub statistic: f64,
    pub p_value: f64,
}

// Polynomial coefficients from AS R94, low order first.
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

fn poly(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Shapiro-Wilk normality test via the AS R94 approximation.
///
/// Valid for 3 ≤ n ≤ 5000. Returns `None` when the sample size is out of
/// range or the sample has zero range (W is undefined for constant data);
/// callers treat that as "normality undetermined".
pub fn shapiro_wilk(sample: &[f64]) -> Option<ShapiroWilk> {
    let n = sample.len();
    if !(3..=5000).contains(&n) {
        return None;
    }

    let mut x = sample.to_vec();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let range = x[n - 1] - x[0];
    if range < 1e-19 {
        return None;
    }

    let nf = n as f64;
    let n2 = n / 2;
    let normal = Normal::standard();

    // Weights for the lower half of the order statistics.
    let mut a = vec![0.0f64; n2];
    if n == 3 {
        a[0] = FRAC_1_SQRT_2;
    } else {
        let an25 = nf + 0.25;
        let mut summ2 = 0.0;
        for (i, w) in a.iter_mut().enumerate() {
            *w = normal.inverse_cdf(((i + 1) as f64 - 0.375) / an25);
            summ2 += *w * *w;
        }
        summ2 *= 2.0;
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / nf.sqrt();
        let a1 = poly(&SW_C1, rsn) - a[0] / ssumm2;

        let (skip, fac) = if n > 5 {
            let a2 = -a[1] / ssumm2 + poly(&SW_C2, rsn);
            let fac = ((summ2 - 2.0 * a[0] * a[0] - 2.0 * a[1] * a[1])
                / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
                .sqrt();
            a[1] = a2;
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * a[0] * a[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
            (1, fac)
        };
        a[0] = a1;
        for w in a.iter_mut().skip(skip) {
            *w /= -fac;
        }
    }

    let mean = x.iter().sum::<f64>() / nf;
    let ssq: f64 = x.iter().map(|v| (v - mean) * (v - mean)).sum();
    let mut b = 0.0;
    for i in 0..n2 {
        b += a[i] * (x[n - 1 - i] - x[i]);
    }
    let w = ((b * b) / ssq).min(1.0);

    let p_value = if n == 3 {
        let stqr = (0.75f64).sqrt().asin();
        ((6.0 / PI) * (w.sqrt().asin() - stqr)).clamp(0.0, 1.0)
    } else {
        let y = (1.0 - w).ln();
        let (z_num, mu, sigma) = if n <= 11 {
            let gamma = poly(&SW_G, nf);
            if y >= gamma {
                // W in the extreme tail; p-value underflows.
                return Some(ShapiroWilk {
                    statistic: w,
                    p_value: 1e-99,
                });
            }
            (
                -(gamma - y).ln(),
                poly(&SW_C3, nf),
                poly(&SW_C4, nf).exp(),
            )
        } else {
            let ln_n = nf.ln();
            (y, poly(&SW_C5, ln_n), poly(&SW_C6, ln_n).exp())
        };
        normal.sf((z_num - mu) / sigma).clamp(0.0, 1.0)
    };

    Some(ShapiroWilk {
        statistic: w,
        p_value,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Paired t-test
// ═══════════════════════════════════════════════════════════════════════════════

/// Paired t statistic and two-sided p-value.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sided paired t-test on `second - first`.
///
/// Returns `None` when fewer than 2 pairs exist or the differences have zero
/// sample variance (the statistic is undefined, not infinite evidence).
pub fn paired_t_test(second: &[f64], first: &[f64]) -> Option<TTest> {
    let n = first.len();
    if n < 2 || second.len() != n {
        return None;
    }
    let diffs: Vec<f64> = second.iter().zip(first).map(|(b, a)| b - a).collect();
    let nf = n as f64;
    let mean = diffs.iter().sum::<f64>() / nf;
    let var = diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / (nf - 1.0);
    if var <= 0.0 {
        return None;
    }
    let t = mean / (var.sqrt() / nf.sqrt());
    let dist = StudentsT::new(0.0, 1.0, nf - 1.0).ok()?;
    let p = (2.0 * dist.sf(t.abs())).min(1.0);
    Some(TTest {
        statistic: t,
        p_value: p,
    })
}

/// Cohen's d for paired samples: `mean(diff) / sd(diff)` with sample-corrected
/// standard deviation. `None` under the same conditions as [`paired_t_test`].
pub fn cohen_d_paired(second: &[f64], first: &[f64]) -> Option<f64> {
    let n = first.len();
    if n < 2 || second.len() != n {
        return None;
    }
    let diffs: Vec<f64> = second.iter().zip(first).map(|(b, a)| b - a).collect();
    let nf = n as f64;
    let mean = diffs.iter().sum::<f64>() / nf;
    let var = diffs.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / (nf - 1.0);
    if var <= 0.0 {
        return None;
    }
    Some(mean / var.sqrt())
}

/// Bucket Cohen's d: |d| < 0.2 Small, < 0.8 Medium, else Large.
pub fn interpret_cohen_d(d: f64) -> EffectMagnitude {
    let d = d.abs();
    if d < 0.2 {
        EffectMagnitude::Small
    } else if d < 0.8 {
        EffectMagnitude::Medium
    } else {
        EffectMagnitude::Large
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Wilcoxon signed-rank test
// ═══════════════════════════════════════════════════════════════════════════════

/// Wilcoxon W statistic and two-sided p-value (normal approximation).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WilcoxonTest {
    pub statistic: f64,
    pub p_value: f64,
}

/// Two-sided Wilcoxon signed-rank test on `second - first`.
///
/// Zero differences are dropped before ranking; tied absolute differences
/// receive averaged ranks; the p-value comes from the normal approximation
/// `z = (W - n(n+1)/4) / sqrt(n(n+1)(2n+1)/24)` over the nonzero-difference
/// count. Returns `None` when no nonzero differences remain.
pub fn wilcoxon_signed_rank(second: &[f64], first: &[f64]) -> Option<WilcoxonTest> {
    if second.len() != first.len() {
        return None;
    }
    let diffs: Vec<f64> = second
        .iter()
        .zip(first)
        .map(|(b, a)| b - a)
        .filter(|&d| d != 0.0)
        .collect();
    if diffs.is_empty() {
        return None;
    }

    let ranks = average_ranks(&diffs);
    let mut w_plus = 0.0;
    let mut w_minus = 0.0;
    for (d, r) in diffs.iter().zip(&ranks) {
        if *d > 0.0 {
            w_plus += r;
        } else {
            w_minus += r;
        }
    }
    let w = w_plus.min(w_minus);

    let nf = diffs.len() as f64;
    let expected = nf * (nf + 1.0) / 4.0;
    let se = (nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0).sqrt();
    let z = (w - expected) / se;
    let normal = Normal::standard();
    let p = (2.0 * normal.sf(z.abs())).min(1.0);
    Some(WilcoxonTest {
        statistic: w,
        p_value: p,
    })
}

/// Ranks of |diffs| (1-based), ties averaged.
fn average_ranks(diffs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..diffs.len()).collect();
    order.sort_by(|&i, &j| {
        diffs[i]
            .abs()
            .partial_cmp(&diffs[j].abs())
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; diffs.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j < order.len() && diffs[order[j]].abs() == diffs[order[i]].abs() {
            j += 1;
        }
        // Positions i..j hold tied values; they share the average rank.
        let avg = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg;
        }
        i = j;
    }
    ranks
}

/// Effect-size proxy for the rank test: convert the two-sided p-value back to
/// a z-score and normalize, `r = |Φ⁻¹(p/2)| / sqrt(n)`. `n` is the full
/// difference count, zeros included. `None` when p is not strictly positive.
pub fn rank_effect_size(p_value: f64, n_diffs: usize) -> Option<f64> {
    if p_value <= 0.0 || n_diffs == 0 {
        return None;
    }
    let normal = Normal::standard();
    let z = normal.inverse_cdf(p_value / 2.0);
    Some(z.abs() / (n_diffs as f64).sqrt())
}

/// Bucket the rank correlation: |r| < 0.1 Small, < 0.3 Medium, else Large.
pub fn interpret_rank_r(r: f64) -> EffectMagnitude {
    let r = r.abs();
    if r < 0.1 {
        EffectMagnitude::Small
    } else if r < 0.3 {
        EffectMagnitude::Medium
    } else {
        EffectMagnitude::Large
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Comparison procedure
// ═══════════════════════════════════════════════════════════════════════════════

/// Run the full adaptive comparison on one paired sample.
///
/// Procedure:
/// 1. Empty sample → insufficient result (label and count only).
/// 2. All differences exactly zero → insufficient result at any n.
/// 3. Shapiro-Wilk on the differences when n ≥ 3; otherwise (and for
///    zero-variance differences, where W is undefined) normality is
///    undetermined and counts as passing.
/// 4. Normal → paired t-test + Cohen's d. Not normal → Wilcoxon signed-rank
///    (n ≥ 2) + rank effect size.
/// 5. Verdict from `p < alpha`, only when a p-value exists.
pub fn compare_paired(
    first: &[f64],
    second: &[f64],
    label: &str,
    cfg: &TestConfig,
) -> TestResult {
    let n = first.len();
    if first.is_empty() || second.is_empty() {
        return TestResult::insufficient(label, n);
    }

    let diffs: Vec<f64> = second.iter().zip(first).map(|(b, a)| b - a).collect();
    if diffs.iter().all(|&d| d == 0.0) {
        // No variation to test at all.
        return TestResult::insufficient(label, n);
    }

    let shapiro_p = if diffs.len() >= 3 {
        shapiro_wilk(&diffs).map(|r| r.p_value)
    } else {
        None
    };
    // Undetermined normality counts as passing the gate.
    let is_normal = shapiro_p.is_none_or(|p| p > cfg.normality_alpha);

    let (test_used, p_value, effect_size, effect_magnitude) = if is_normal {
        let p = paired_t_test(second, first).map(|t| t.p_value);
        let d = cohen_d_paired(second, first);
        (
            ChosenTest::PairedT,
            p,
            d,
            d.map(interpret_cohen_d),
        )
    } else {
        let p = if diffs.len() >= 2 {
            wilcoxon_signed_rank(second, first).map(|w| w.p_value)
        } else {
            None
        };
        let r = p.and_then(|p| rank_effect_size(p, diffs.len()));
        (
            ChosenTest::Wilcoxon,
            p,
            r,
            r.map(interpret_rank_r),
        )
    };

    let verdict = p_value.map(|p| {
        if p < cfg.alpha {
            Verdict::Significant
        } else {
            Verdict::NotSignificant
        }
    });

    TestResult {
        comparison: label.to_string(),
        num_cases: n,
        shapiro_p,
        test_used: Some(test_used),
        p_value,
        effect_size,
        effect_magnitude,
        verdict,
    }
}
