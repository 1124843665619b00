pub mod compare;
pub mod inspect;

use anyhow::{Context, Result};
use pairstat_core::Config;
use std::path::Path;

/// CLI flag overrides applied on top of the file-loaded (or default) config.
#[derive(Debug, Default)]
pub struct ConfigOverrides<'a> {
    pub expected_cols: Option<usize>,
    pub metrics: Option<&'a str>,
    pub kinds: Option<&'a str>,
    pub zero_missing: Option<&'a str>,
    pub study_first: Option<&'a str>,
    pub study_second: Option<&'a str>,
    pub alpha: Option<f64>,
    pub normality_alpha: Option<f64>,
}

/// Resolve the effective configuration: defaults, then the optional JSON
/// file, then any CLI flags, then validation.
pub fn resolve_config(config_path: Option<&str>, ov: &ConfigOverrides) -> Result<Config> {
    let mut cfg = match config_path {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("loading configuration from {path}"))?,
        None => Config::default(),
    };

    if let Some(n) = ov.expected_cols {
        cfg.expected_columns = n;
    }
    if let Some(list) = ov.metrics {
        cfg.metrics = parse_list(list);
    }
    if let Some(list) = ov.kinds {
        cfg.kinds = parse_list(list);
    }
    if let Some(list) = ov.zero_missing {
        cfg.zero_missing_fields = parse_list(list);
    }
    if let Some(tok) = ov.study_first {
        cfg.study_first = tok.to_string();
    }
    if let Some(tok) = ov.study_second {
        cfg.study_second = tok.to_string();
    }
    if let Some(alpha) = ov.alpha {
        cfg.alpha = alpha;
    }
    if let Some(alpha) = ov.normality_alpha {
        cfg.normality_alpha = alpha;
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Split a comma-separated flag value into trimmed, non-empty names.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Render an optional float for console tables.
pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.4}"),
        None => "—".to_string(),
    }
}
