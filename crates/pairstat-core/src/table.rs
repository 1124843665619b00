//! Whitespace-delimited experiment table reader.
//!
//! The input format is forgiving by design: the first line names the columns,
//! every following line is one observation, and row widths are normalized to
//! a fixed expected column count: extra trailing fields are dropped, missing
//! trailing fields become missing values. Parsing produces a flat
//! [`CleanTable`] (typed cells, zero-as-missing masking applied) which pivots
//! into the nested [`StudyTable`] lookup the comparison driver consumes:
//! case → study slot → row kind → metric → [`Cell`].

use crate::config::Config;
use crate::error::ParseError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Absolute tolerance below which a value counts as zero for the
/// zero-as-missing convention.
pub const ZERO_TOLERANCE: f64 = 1e-8;

// ---------------------------------------------------------------------------
// Cells
// ---------------------------------------------------------------------------

/// One parsed table cell. The single tagged parse result used everywhere a
/// token is interpreted numerically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Cell {
    Number(f64),
    Missing,
    /// A token was present but not numeric. Treated as missing downstream;
    /// the reader logs it once at `warn` level.
    Malformed,
}

impl Cell {
    /// Parse one token. Empty strings, `NA`/`NaN` (any case) and parseable
    /// NaN floats are [`Cell::Missing`]; other unparseable tokens are
    /// [`Cell::Malformed`].
    pub fn parse(token: &str) -> Cell {
        let t = token.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("na") || t.eq_ignore_ascii_case("nan") {
            return Cell::Missing;
        }
        match t.parse::<f64>() {
            Ok(v) if v.is_nan() => Cell::Missing,
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Malformed,
        }
    }

    /// The numeric value, if this cell holds one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        !matches!(self, Cell::Number(_))
    }
}

// ---------------------------------------------------------------------------
// Flat cleaned table
// ---------------------------------------------------------------------------

/// One width-normalized observation with its key columns extracted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRow {
    pub case: String,
    pub study: String,
    pub kind: String,
    /// Metric column name → cell, for every non-key column.
    pub values: BTreeMap<String, Cell>,
}

/// The flat table after width normalization, typed-cell parsing, and
/// zero-as-missing masking. Intermediate between the raw file and the
/// nested [`StudyTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanTable {
    /// All column names in file order, synthesized placeholders included.
    pub headers: Vec<String>,
    pub rows: Vec<CleanRow>,
    /// Header names of the case, study, and row-kind columns, in that order.
    key_columns: [String; 3],
}

impl CleanTable {
    /// Read and clean a table file.
    ///
    /// Fails only on I/O problems or when one of the three required columns
    /// is absent from the header. Everything else is tolerated: over-wide
    /// rows are truncated, narrow rows padded, non-numeric metric cells
    /// logged and carried as [`Cell::Malformed`], and rows with a missing
    /// key token skipped.
    pub fn read(path: &Path, cfg: &Config) -> Result<CleanTable, ParseError> {
        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();

        let header_line = match lines.next() {
            Some(line) => line?,
            None => String::new(),
        };
        let mut headers: Vec<String> = header_line
            .split_whitespace()
            .map(|s| s.to_string())
            .collect();
        headers.truncate(cfg.expected_columns);
        for i in headers.len()..cfg.expected_columns {
            headers.push(format!("extra_col_{i}"));
        }

        let missing: Vec<&str> = cfg
            .required_columns()
            .into_iter()
            .filter(|c| !headers.iter().any(|h| h == c))
            .collect();
        if !missing.is_empty() {
            return Err(ParseError::Schema {
                missing: missing.join(", "),
            });
        }

        let case_idx = headers.iter().position(|h| h == &cfg.case_column).unwrap();
        let study_idx = headers.iter().position(|h| h == &cfg.study_column).unwrap();
        let kind_idx = headers.iter().position(|h| h == &cfg.kind_column).unwrap();

        let mut rows = Vec::new();
        for (lineno, line) in lines.enumerate() {
            let line = line?;
            let mut tokens: Vec<&str> = line.split_whitespace().collect();
            tokens.truncate(cfg.expected_columns);
            // Right-pad so every row spans the full header.
            tokens.resize(cfg.expected_columns, "");

            let case = tokens[case_idx].to_string();
            let study = tokens[study_idx].to_string();
            let kind = tokens[kind_idx].to_string();
            if key_is_missing(&case) || key_is_missing(&study) || key_is_missing(&kind) {
                log::debug!("line {}: missing key column, row skipped", lineno + 2);
                continue;
            }

            let mut values = BTreeMap::new();
            for (idx, token) in tokens.iter().enumerate() {
                if idx == case_idx || idx == study_idx || idx == kind_idx {
                    continue;
                }
                let cell = Cell::parse(token);
                if cell == Cell::Malformed {
                    log::warn!(
                        "line {}, column {}: non-numeric value {token:?} treated as missing",
                        lineno + 2,
                        headers[idx],
                    );
                }
                values.insert(headers[idx].clone(), cell);
            }
            rows.push(CleanRow {
                case,
                study,
                kind,
                values,
            });
        }

        let mut table = CleanTable {
            headers,
            rows,
            key_columns: [
                cfg.case_column.clone(),
                cfg.study_column.clone(),
                cfg.kind_column.clone(),
            ],
        };
        table.apply_zero_missing(&cfg.zero_missing_fields);
        Ok(table)
    }

    /// Zero-as-missing masking: for each designated field, per (case, study)
    /// group, when the group holds at least one numeric value and every
    /// numeric value is within [`ZERO_TOLERANCE`] of zero, all of the group's
    /// values for that field become missing. Groups with any genuine nonzero
    /// value keep their zeros.
    fn apply_zero_missing(&mut self, fields: &[String]) {
        let fields: Vec<&String> = fields
            .iter()
            .filter(|f| self.headers.contains(f))
            .collect();
        if fields.is_empty() {
            return;
        }

        let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
        for (i, row) in self.rows.iter().enumerate() {
            groups
                .entry((row.case.clone(), row.study.clone()))
                .or_default()
                .push(i);
        }

        for field in fields {
            for indices in groups.values() {
                let mut saw_number = false;
                let mut all_near_zero = true;
                for &i in indices {
                    if let Some(v) = self.rows[i].values.get(field).and_then(Cell::as_number) {
                        saw_number = true;
                        if v.abs() > ZERO_TOLERANCE {
                            all_near_zero = false;
                            break;
                        }
                    }
                }
                if saw_number && all_near_zero {
                    for &i in indices {
                        self.rows[i].values.insert(field.clone(), Cell::Missing);
                    }
                }
            }
        }
    }

    /// Persist the cleaned table as a tab-separated diagnostic artifact.
    /// Missing and malformed cells render as `NA`.
    pub fn write_tsv(&self, path: &Path) -> Result<(), ParseError> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{}", self.headers.join("\t"))?;
        for row in &self.rows {
            let rendered: Vec<String> = self
                .headers
                .iter()
                .map(|h| self.render_field(row, h))
                .collect();
            writeln!(out, "{}", rendered.join("\t"))?;
        }
        out.flush()?;
        Ok(())
    }

    fn render_field(&self, row: &CleanRow, header: &str) -> String {
        let [case_col, study_col, kind_col] = &self.key_columns;
        if header == case_col {
            return row.case.clone();
        }
        if header == study_col {
            return row.study.clone();
        }
        if header == kind_col {
            return row.kind.clone();
        }
        match row.values.get(header) {
            Some(Cell::Number(v)) => format!("{v}"),
            _ => "NA".to_string(),
        }
    }

    /// Pivot into the nested case → study → row-kind → metric lookup.
    /// Rows whose study token matches neither configured study are dropped;
    /// duplicate (case, study, kind) rows overwrite earlier ones.
    pub fn pivot(&self, cfg: &Config) -> StudyTable {
        let mut cases: BTreeMap<String, CaseRecord> = BTreeMap::new();
        for row in &self.rows {
            let slot = if row.study == cfg.study_first {
                StudySlot::First
            } else if row.study == cfg.study_second {
                StudySlot::Second
            } else {
                log::debug!(
                    "case {:?}: unrecognized study {:?}, row dropped",
                    row.case,
                    row.study
                );
                continue;
            };
            cases
                .entry(row.case.clone())
                .or_default()
                .study_mut(slot)
                .kinds
                .insert(row.kind.clone(), row.values.clone());
        }
        StudyTable {
            cases,
            headers: self.headers.clone(),
        }
    }
}

fn key_is_missing(token: &str) -> bool {
    token.is_empty() || token.eq_ignore_ascii_case("na") || token.eq_ignore_ascii_case("nan")
}

// ---------------------------------------------------------------------------
// Nested lookup
// ---------------------------------------------------------------------------

/// The two fixed study slots every case owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StudySlot {
    First,
    Second,
}

/// Row-kind → metric → cell for one case under one study. Possibly empty:
/// the slot exists even when the file had no rows for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudyRecord {
    kinds: BTreeMap<String, BTreeMap<String, Cell>>,
}

impl StudyRecord {
    /// The metric map recorded under a row kind, if any.
    pub fn kind(&self, kind: &str) -> Option<&BTreeMap<String, Cell>> {
        self.kinds.get(kind)
    }

    /// Typed accessor: the cell for a row-kind/metric pair. Absent row kinds
    /// and absent metrics both come back as [`Cell::Missing`], never a panic.
    pub fn value(&self, kind: &str, metric: &str) -> Cell {
        self.kinds
            .get(kind)
            .and_then(|metrics| metrics.get(metric))
            .copied()
            .unwrap_or(Cell::Missing)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kind_names(&self) -> impl Iterator<Item = &String> {
        self.kinds.keys()
    }
}

/// One case: a fixed two-slot record, both study slots always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaseRecord {
    first: StudyRecord,
    second: StudyRecord,
}

impl CaseRecord {
    pub fn study(&self, slot: StudySlot) -> &StudyRecord {
        match slot {
            StudySlot::First => &self.first,
            StudySlot::Second => &self.second,
        }
    }

    fn study_mut(&mut self, slot: StudySlot) -> &mut StudyRecord {
        match slot {
            StudySlot::First => &mut self.first,
            StudySlot::Second => &mut self.second,
        }
    }
}

/// The full nested lookup: case name → [`CaseRecord`]. Case iteration is
/// sorted by name, so downstream sample collection is deterministic
/// regardless of input row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyTable {
    cases: BTreeMap<String, CaseRecord>,
    headers: Vec<String>,
}

impl StudyTable {
    pub fn cases(&self) -> impl Iterator<Item = (&String, &CaseRecord)> {
        self.cases.iter()
    }

    pub fn case(&self, name: &str) -> Option<&CaseRecord> {
        self.cases.get(name)
    }

    pub fn case_count(&self) -> usize {
        self.cases.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Typed accessor through all four levels. Unknown case names come back
    /// as [`Cell::Missing`] like any other absent observation.
    pub fn value(&self, case: &str, slot: StudySlot, kind: &str, metric: &str) -> Cell {
        self.cases
            .get(case)
            .map(|c| c.study(slot).value(kind, metric))
            .unwrap_or(Cell::Missing)
    }
}

/// Read a table file straight into the nested lookup.
pub fn read_table(path: &Path, cfg: &Config) -> Result<StudyTable, ParseError> {
    Ok(CleanTable::read(path, cfg)?.pivot(cfg))
}
