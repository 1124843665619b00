//! Integration tests for pairstat-core.
//!
//! These tests drive the full pipeline on real files:
//! table file → cleaned table → nested lookup → comparison grid → result rows.

use pairstat_core::{Cell, Config, StudySlot, read_table, run_comparisons};
use pairstat_stats::{ChosenTest, Verdict};
use std::io::Write as _;

fn write_file(content: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f
}

fn test_config() -> Config {
    Config {
        expected_columns: 6,
        metrics: vec!["stat_aneu".to_string(), "stat_red".to_string()],
        kinds: vec!["mean".to_string(), "max".to_string()],
        zero_missing_fields: vec!["stat_red".to_string()],
        ..Config::default()
    }
}

/// A well-formed file: five cases, both studies, mean and max rows, a clear
/// upward shift in stat_aneu, and an all-zero stat_red group for case c5.
fn sample_file() -> String {
    let mut s = String::from("Casename Study stat_para stat_aneu stat_red stat_dom\n");
    let aneu = [
        ("c1", 1.00, 1.40),
        ("c2", 2.00, 2.55),
        ("c3", 3.00, 3.45),
        ("c4", 4.00, 4.60),
        ("c5", 5.00, 5.50),
    ];
    for (case, a, b) in aneu {
        let red_1 = if case == "c5" { 0.0 } else { a + 0.2 };
        let red_2 = if case == "c5" { 0.0 } else { b + 0.2 };
        s.push_str(&format!("{case} msa.1 mean {a} {red_1} 9.0\n"));
        s.push_str(&format!("{case} msa.1 max {} {red_1} 9.5\n", a * 2.0));
        s.push_str(&format!("{case} msa.2 mean {b} {red_2} 9.1\n"));
        s.push_str(&format!("{case} msa.2 max {} {red_2} 9.6\n", b * 2.0));
    }
    s
}

#[test]
fn full_run_produces_metric_major_grid() {
    let cfg = test_config();
    let f = write_file(&sample_file());
    let table = read_table(f.path(), &cfg).unwrap();
    assert_eq!(table.case_count(), 5);

    let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());
    assert_eq!(results.len(), cfg.metrics.len() * cfg.kinds.len());
    let labels: Vec<&str> = results.iter().map(|r| r.comparison.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "stat_aneu mean",
            "stat_aneu max",
            "stat_red mean",
            "stat_red max"
        ]
    );
}

#[test]
fn full_run_detects_consistent_shift() {
    let cfg = test_config();
    let f = write_file(&sample_file());
    let table = read_table(f.path(), &cfg).unwrap();
    let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());

    // stat_aneu mean diffs [0.40, 0.55, 0.45, 0.60, 0.50]: near-normal,
    // strongly positive. The t-test path should fire and call it significant.
    let r = &results[0];
    assert_eq!(r.num_cases, 5);
    assert_eq!(r.test_used, Some(ChosenTest::PairedT));
    assert!(r.shapiro_p.unwrap() > 0.05);
    assert!(r.p_value.unwrap() < 0.05);
    assert_eq!(r.verdict, Some(Verdict::Significant));
    assert!(r.effect_size.is_some());
}

#[test]
fn zero_masked_group_shrinks_sample() {
    let cfg = test_config();
    let f = write_file(&sample_file());
    let table = read_table(f.path(), &cfg).unwrap();

    // c5's stat_red group is all-zero under both studies → masked → dropped
    // from the pair, so stat_red compares 4 cases to stat_aneu's 5.
    assert_eq!(
        table.value("c5", StudySlot::First, "mean", "stat_red"),
        Cell::Missing
    );
    let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());
    assert_eq!(results[0].num_cases, 5);
    assert_eq!(results[2].num_cases, 4);
}

#[test]
fn parsing_is_idempotent() {
    let cfg = test_config();
    let f = write_file(&sample_file());
    let first = read_table(f.path(), &cfg).unwrap();
    let second = read_table(f.path(), &cfg).unwrap();
    assert_eq!(first, second);
}

#[test]
fn one_sided_case_contributes_nothing() {
    let cfg = test_config();
    let mut content = sample_file();
    // A sixth case observed only under the first study.
    content.push_str("c6 msa.1 mean 100.0 100.0 100.0\n");
    let f = write_file(&content);
    let table = read_table(f.path(), &cfg).unwrap();
    assert_eq!(table.case_count(), 6);

    let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());
    // Still 5 paired cases for stat_aneu mean.
    assert_eq!(results[0].num_cases, 5);
}

#[test]
fn ragged_rows_are_tolerated() {
    let cfg = test_config();
    let content = "Casename Study stat_para stat_aneu stat_red stat_dom\n\
                   c1 msa.1 mean 1.0\n\
                   c1 msa.2 mean 1.5 2.5 3.5 99.0 99.0\n";
    let f = write_file(content);
    let table = read_table(f.path(), &cfg).unwrap();
    assert_eq!(
        table.value("c1", StudySlot::First, "mean", "stat_red"),
        Cell::Missing
    );
    assert_eq!(
        table.value("c1", StudySlot::Second, "mean", "stat_red"),
        Cell::Number(2.5)
    );
}

#[test]
fn schema_failure_aborts_with_named_columns() {
    let cfg = test_config();
    let f = write_file("Casename Experiment kind a b c\nc1 msa.1 mean 1 2 3\n");
    let err = read_table(f.path(), &cfg).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("missing required columns"), "{msg}");
    assert!(msg.contains("Study"), "{msg}");
    assert!(msg.contains("stat_para"), "{msg}");
}

#[test]
fn metric_in_header_without_data_yields_null_rows() {
    let cfg = Config {
        expected_columns: 5,
        metrics: vec!["stat_aneu".to_string(), "stat_empty".to_string()],
        kinds: vec!["mean".to_string()],
        zero_missing_fields: vec![],
        ..Config::default()
    };
    // stat_empty exists as a column but never holds a value.
    let content = "Casename Study stat_para stat_aneu stat_empty\n\
                   c1 msa.1 mean 1.0 NA\n\
                   c1 msa.2 mean 1.5 NA\n\
                   c2 msa.1 mean 2.0\n\
                   c2 msa.2 mean 2.5\n";
    let f = write_file(content);
    let table = read_table(f.path(), &cfg).unwrap();
    let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].comparison, "stat_aneu mean");
    assert_eq!(results[0].num_cases, 2);
    let empty = &results[1];
    assert_eq!(empty.comparison, "stat_empty mean");
    assert_eq!(empty.num_cases, 0);
    assert!(empty.shapiro_p.is_none());
    assert!(empty.test_used.is_none());
    assert!(empty.p_value.is_none());
    assert!(empty.verdict.is_none());
}

#[test]
fn degenerate_identical_studies_yield_null_rows() {
    let cfg = Config {
        expected_columns: 4,
        metrics: vec!["stat_aneu".to_string()],
        kinds: vec!["mean".to_string()],
        zero_missing_fields: vec![],
        ..Config::default()
    };
    let content = "Casename Study stat_para stat_aneu\n\
                   c1 msa.1 mean 1.0\n\
                   c1 msa.2 mean 1.0\n\
                   c2 msa.1 mean 1.0\n\
                   c2 msa.2 mean 1.0\n\
                   c3 msa.1 mean 1.0\n\
                   c3 msa.2 mean 1.0\n";
    let f = write_file(content);
    let table = read_table(f.path(), &cfg).unwrap();
    let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.num_cases, 3);
    assert!(r.shapiro_p.is_none());
    assert!(r.test_used.is_none());
    assert!(r.p_value.is_none());
    assert!(r.effect_size.is_none());
    assert!(r.verdict.is_none());
}
