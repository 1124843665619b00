use anyhow::{Context, Result};
use pairstat_core::{CleanTable, StudySlot, StudyTable, collect_pair};
use std::collections::BTreeSet;
use std::path::Path;

pub struct InspectCommandConfig<'a> {
    pub input: &'a str,
    pub config_path: Option<&'a str>,
    pub overrides: super::ConfigOverrides<'a>,
}

/// Parse the table and report structure: row/case counts, row kinds seen per
/// study, and paired coverage for every configured metric × row-kind.
pub fn run(cmd: InspectCommandConfig) -> Result<()> {
    let cfg = super::resolve_config(cmd.config_path, &cmd.overrides)?;

    let clean = CleanTable::read(Path::new(cmd.input), &cfg)
        .with_context(|| format!("reading {}", cmd.input))?;
    let table = clean.pivot(&cfg);

    println!("File: {}", cmd.input);
    println!(
        "Columns: {} ({} configured)",
        clean.headers.len(),
        cfg.expected_columns
    );
    println!("Observation rows: {}", clean.rows.len());
    println!("Cases: {}", table.case_count());

    let mut kinds_seen: BTreeSet<&String> = BTreeSet::new();
    let mut one_sided = 0usize;
    for (_name, case) in table.cases() {
        for slot in [StudySlot::First, StudySlot::Second] {
            kinds_seen.extend(case.study(slot).kind_names());
        }
        if case.study(StudySlot::First).is_empty() || case.study(StudySlot::Second).is_empty() {
            one_sided += 1;
        }
    }
    let kind_list: Vec<&str> = kinds_seen.iter().map(|s| s.as_str()).collect();
    println!("Row kinds observed: {}", kind_list.join(", "));
    if one_sided > 0 {
        println!(
            "Cases present under only one study: {one_sided} (excluded from every pair)"
        );
    }

    println!("\nPaired coverage ({} vs {}):", cfg.study_first, cfg.study_second);
    println!(
        "{:<16} {:<8} {:>7} {:>10}",
        "Metric", "Kind", "Paired", "Coverage"
    );
    println!("{}", "-".repeat(46));
    for metric in &cfg.metrics {
        for kind in &cfg.kinds {
            let pair = collect_pair(&table, metric, kind);
            println!(
                "{:<16} {:<8} {:>7} {:>9.0}%",
                metric,
                kind,
                pair.len(),
                coverage_pct(&table, pair.len()),
            );
        }
    }

    Ok(())
}

fn coverage_pct(table: &StudyTable, paired: usize) -> f64 {
    if table.case_count() == 0 {
        return 0.0;
    }
    100.0 * paired as f64 / table.case_count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_runs_on_valid_file() {
        use std::io::Write as _;
        let mut input = tempfile::NamedTempFile::new().unwrap();
        write!(
            input,
            "Casename Study stat_para stat_aneu\n\
             c1 msa.1 mean 1.0\nc1 msa.2 mean 1.5\n\
             c2 msa.1 mean 2.0\n"
        )
        .unwrap();

        run(InspectCommandConfig {
            input: input.path().to_str().unwrap(),
            config_path: None,
            overrides: crate::commands::ConfigOverrides {
                expected_cols: Some(4),
                metrics: Some("stat_aneu"),
                kinds: Some("mean"),
                ..Default::default()
            },
        })
        .unwrap();
    }

    #[test]
    fn test_inspect_schema_error_propagates() {
        use std::io::Write as _;
        let mut input = tempfile::NamedTempFile::new().unwrap();
        write!(input, "foo bar baz\n1 2 3\n").unwrap();

        let err = run(InspectCommandConfig {
            input: input.path().to_str().unwrap(),
            config_path: None,
            overrides: crate::commands::ConfigOverrides {
                expected_cols: Some(3),
                ..Default::default()
            },
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("missing required columns"));
    }
}
