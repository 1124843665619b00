//! Comparison driver: sweeps the configured metric × row-kind grid over the
//! nested lookup and feeds each paired sample to the test engine.

use crate::table::{StudySlot, StudyTable};
use pairstat_stats::{TestConfig, TestResult, compare_paired};
use serde::Serialize;

/// Aligned paired observations for one metric × row-kind: one value per
/// study for every case that has both. Built paired-complete-only; cases
/// missing either side are dropped before they get here.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SamplePair {
    pub first: Vec<f64>,
    pub second: Vec<f64>,
}

impl SamplePair {
    pub fn push(&mut self, first: f64, second: f64) {
        self.first.push(first);
        self.second.push(second);
    }

    pub fn len(&self) -> usize {
        self.first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }
}

/// Collect the paired-complete observations for one metric × row-kind.
///
/// Scans every case (sorted order) and keeps it only when BOTH study slots
/// hold a numeric value for the metric under that row kind. Missing,
/// malformed, and one-sided observations contribute nothing.
pub fn collect_pair(table: &StudyTable, metric: &str, kind: &str) -> SamplePair {
    let mut pair = SamplePair::default();
    for (_name, case) in table.cases() {
        let first = case.study(StudySlot::First).value(kind, metric).as_number();
        let second = case.study(StudySlot::Second).value(kind, metric).as_number();
        if let (Some(a), Some(b)) = (first, second) {
            pair.push(a, b);
        }
    }
    pair
}

/// Run every configured comparison and return one [`TestResult`] per
/// metric × row-kind, metric-major, both in caller order. The output always
/// has exactly `metrics.len() * kinds.len()` rows; combinations without data
/// yield insufficient-data rows rather than being dropped.
pub fn run_comparisons(
    table: &StudyTable,
    metrics: &[String],
    kinds: &[String],
    cfg: &TestConfig,
) -> Vec<TestResult> {
    let mut results = Vec::with_capacity(metrics.len() * kinds.len());
    for metric in metrics {
        for kind in kinds {
            let pair = collect_pair(table, metric, kind);
            let label = format!("{metric} {kind}");
            log::debug!("{label}: {} paired cases", pair.len());
            results.push(compare_paired(&pair.first, &pair.second, &label, cfg));
        }
    }
    results
}
