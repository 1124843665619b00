use anyhow::{Context, Result};
use pairstat_core::{CleanTable, run_comparisons};
use pairstat_stats::{CSV_HEADER, TestResult};
use std::fs;
use std::path::Path;

pub struct CompareCommandConfig<'a> {
    pub input: &'a str,
    pub output: &'a str,
    pub json_path: Option<&'a str>,
    pub dump_clean: Option<&'a str>,
    pub config_path: Option<&'a str>,
    pub overrides: super::ConfigOverrides<'a>,
}

pub fn run(cmd: CompareCommandConfig) -> Result<()> {
    let cfg = super::resolve_config(cmd.config_path, &cmd.overrides)?;

    let clean = CleanTable::read(Path::new(cmd.input), &cfg)
        .with_context(|| format!("reading {}", cmd.input))?;
    log::debug!(
        "{}: {} columns, {} observation rows",
        cmd.input,
        clean.headers.len(),
        clean.rows.len()
    );

    if let Some(path) = cmd.dump_clean {
        clean
            .write_tsv(Path::new(path))
            .with_context(|| format!("writing cleaned table to {path}"))?;
        println!("Cleaned table saved to: {path}");
    }

    let table = clean.pivot(&cfg);
    println!(
        "Comparing {} cases: {} metrics × {} row kinds ({} vs {})\n",
        table.case_count(),
        cfg.metrics.len(),
        cfg.kinds.len(),
        cfg.study_first,
        cfg.study_second
    );

    let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());
    print_summary(&results);

    write_csv(Path::new(cmd.output), &results)
        .with_context(|| format!("writing results to {}", cmd.output))?;
    println!("\nResults saved to: {}", cmd.output);

    if let Some(path) = cmd.json_path {
        let json = serde_json::to_string_pretty(&results)?;
        fs::write(path, json).with_context(|| format!("writing JSON results to {path}"))?;
        println!("JSON results saved to: {path}");
    }

    Ok(())
}

fn write_csv(path: &Path, results: &[TestResult]) -> std::io::Result<()> {
    let mut out = String::with_capacity(results.len() * 96);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in results {
        out.push_str(&r.csv_row());
        out.push('\n');
    }
    fs::write(path, out)
}

fn print_summary(results: &[TestResult]) {
    println!(
        "{:<22} {:>4} {:>10} {:>26} {:>10} {:>8}  {}",
        "Comparison", "N", "Shapiro p", "Test used", "p-value", "Effect", "Result"
    );
    println!("{}", "-".repeat(100));
    for r in results {
        println!(
            "{:<22} {:>4} {:>10} {:>26} {:>10} {:>8}  {}",
            r.comparison,
            r.num_cases,
            super::fmt_opt(r.shapiro_p),
            r.test_used.map(|t| t.as_str()).unwrap_or("—"),
            super::fmt_opt(r.p_value),
            super::fmt_opt(r.effect_size),
            r.verdict.map(|v| v.as_str()).unwrap_or("—"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairstat_stats::{TestConfig, compare_paired};

    #[test]
    fn test_write_csv_shape() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.4, 2.55, 3.45, 4.6, 5.5];
        let results = vec![
            compare_paired(&a, &b, "stat_aneu mean", &TestConfig::default()),
            TestResult::insufficient("stat_red max", 0),
        ];
        let out = tempfile::NamedTempFile::new().unwrap();
        write_csv(out.path(), &results).unwrap();
        let text = fs::read_to_string(out.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("stat_aneu mean,5,"));
        assert_eq!(lines[2], "stat_red max,0,,,,,,");
        for line in &lines {
            assert_eq!(line.split(',').count(), 8, "bad column count: {line}");
        }
    }

    #[test]
    fn test_end_to_end_run() {
        use std::io::Write as _;
        let mut input = tempfile::NamedTempFile::new().unwrap();
        write!(
            input,
            "Casename Study stat_para stat_aneu\n\
             c1 msa.1 mean 1.0\nc1 msa.2 mean 1.4\n\
             c2 msa.1 mean 2.0\nc2 msa.2 mean 2.6\n\
             c3 msa.1 mean 3.0\nc3 msa.2 mean 3.5\n"
        )
        .unwrap();
        let output = tempfile::NamedTempFile::new().unwrap();
        let json = tempfile::NamedTempFile::new().unwrap();

        run(CompareCommandConfig {
            input: input.path().to_str().unwrap(),
            output: output.path().to_str().unwrap(),
            json_path: Some(json.path().to_str().unwrap()),
            dump_clean: None,
            config_path: None,
            overrides: crate::commands::ConfigOverrides {
                expected_cols: Some(4),
                metrics: Some("stat_aneu"),
                kinds: Some("mean"),
                zero_missing: Some(""),
                ..Default::default()
            },
        })
        .unwrap();

        let csv = fs::read_to_string(output.path()).unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().starts_with("stat_aneu mean,3,"));

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json.path()).unwrap()).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }
}
