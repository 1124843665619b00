//! # pairstat-core
//!
//! Parsing and orchestration for paired two-study experiment comparisons.
//!
//! The input is a whitespace-delimited table: every row is one observation of
//! one case under one of two studies, holding a row-kind (summary index, e.g.
//! `mean` or `max`) and a set of metric values. This crate reshapes that file
//! into a nested case → study → row-kind → metric lookup and sweeps a
//! configured metric × row-kind grid through the paired test engine in
//! `pairstat-stats`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pairstat_core::{Config, read_table, run_comparisons};
//!
//! let cfg = Config::default();
//! let table = read_table("data/combin_von_mises.txt".as_ref(), &cfg)?;
//! let results = run_comparisons(&table, &cfg.metrics, &cfg.kinds, &cfg.test_config());
//! assert_eq!(results.len(), cfg.metrics.len() * cfg.kinds.len());
//! # Ok::<(), pairstat_core::ParseError>(())
//! ```
//!
//! ## Pipeline
//!
//! File → [`CleanTable`] (width-normalized, typed cells, zero-as-missing
//! masking) → [`StudyTable`] (nested lookup) → [`run_comparisons`] →
//! result rows.
//!
//! Structural problems (missing required columns) abort; everything about
//! the data itself degrades gracefully into missing values and
//! insufficient-data result rows.

pub mod config;
pub mod driver;
pub mod error;
pub mod table;

pub use config::Config;
pub use driver::{SamplePair, collect_pair, run_comparisons};
pub use error::ParseError;
pub use table::{
    CaseRecord, Cell, CleanRow, CleanTable, StudyRecord, StudySlot, StudyTable, ZERO_TOLERANCE,
    read_table,
};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
