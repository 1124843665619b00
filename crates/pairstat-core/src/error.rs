//! Error taxonomy for parsing and configuration.
//!
//! Only structural failures surface here. Non-numeric contamination inside
//! the table body is localized: the offending cell becomes missing (with a
//! `warn` log line) and the run continues, so no error variant exists for it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Required columns absent from the input header. Aborts the run.
    #[error("missing required columns: {missing}")]
    Schema { missing: String },

    /// Rejected configuration values or an unreadable configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
