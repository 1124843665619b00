//! Run configuration.
//!
//! Everything the comparison run depends on (column names, study tokens,
//! the metric and row-kind grids, the zero-as-missing field set, and the two
//! significance thresholds) lives in one struct. Defaults reproduce the
//! aneurysm wall-stress study this tool was first written for; a JSON file
//! or CLI flags override them.

use crate::error::ParseError;
use pairstat_stats::TestConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed column count rows are truncated/padded to.
    pub expected_columns: usize,
    /// Header name of the case-identifier column.
    pub case_column: String,
    /// Header name of the study-identifier column.
    pub study_column: String,
    /// Header name of the row-kind (summary index) column.
    pub kind_column: String,
    /// Token identifying the first study.
    pub study_first: String,
    /// Token identifying the second study.
    pub study_second: String,
    /// Metric columns to compare.
    pub metrics: Vec<String>,
    /// Row kinds to compare per metric.
    pub kinds: Vec<String>,
    /// Fields where an all-near-zero (case, study) group means missing data.
    pub zero_missing_fields: Vec<String>,
    /// Significance level for the comparison verdict.
    pub alpha: f64,
    /// Shapiro-Wilk gate level for test selection.
    pub normality_alpha: f64,
}

impl Default for Config {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        Config {
            expected_columns: 15,
            case_column: "Casename".to_string(),
            study_column: "Study".to_string(),
            kind_column: "stat_para".to_string(),
            study_first: "msa.1".to_string(),
            study_second: "msa.2".to_string(),
            metrics: owned(&[
                "stat_aneu",
                "stat_dom",
                "stat_bod",
                "stat_nek",
                "stat_part",
                "stat_press",
                "stat_bleb.0",
                "stat_bleb.1",
                "stat_red",
                "stat_yel",
                "stat_wht",
                "stat_rupt",
            ]),
            kinds: owned(&["mean", "max"]),
            zero_missing_fields: owned(&[
                "stat_yel",
                "stat_wht",
                "stat_red",
                "stat_rupt",
                "stat_bleb.0",
                "stat_bleb.1",
            ]),
            alpha: 0.05,
            normality_alpha: 0.05,
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file. Absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Config, ParseError> {
        let file = File::open(path)?;
        let cfg: Config = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ParseError::Config(format!("{}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the run cannot work with.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.expected_columns == 0 {
            return Err(ParseError::Config("expected_columns must be positive".into()));
        }
        if self.study_first == self.study_second {
            return Err(ParseError::Config(format!(
                "study tokens must differ, both are {:?}",
                self.study_first
            )));
        }
        for (name, value) in [("alpha", self.alpha), ("normality_alpha", self.normality_alpha)] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ParseError::Config(format!(
                    "{name} must lie in (0, 1), got {value}"
                )));
            }
        }
        Ok(())
    }

    /// The thresholds the test engine needs.
    pub fn test_config(&self) -> TestConfig {
        TestConfig {
            alpha: self.alpha,
            normality_alpha: self.normality_alpha,
        }
    }

    /// The three required header names.
    pub fn required_columns(&self) -> [&str; 3] {
        [&self.case_column, &self.study_column, &self.kind_column]
    }
}
