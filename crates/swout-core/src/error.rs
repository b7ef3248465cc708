//! Error types and severity-tagged diagnostics.
//!
//! Fatal problems are returned as [`OutputError`] and end the current run.
//! Recoverable problems are collected as warnings in [`Diagnostics`] and
//! mirrored to the `log` facade.

use std::fmt;

use log::warn;
use thiserror::Error;

use crate::keys::OutKey;

/// Errors raised while configuring or running the output engine.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Malformed line in the output setup file.
    #[error("output setup line {line}: {message}")]
    Config { line: usize, message: String },

    /// Key name that is not part of the registry.
    #[error("unknown output key '{0}'")]
    UnknownKey(String),

    /// Summary type keyword other than OFF/SUM/AVG/FIN.
    #[error("unknown summary type '{0}'")]
    UnknownPolicy(String),

    /// Period keyword other than DY/WK/MO/YR.
    #[error("unknown output period '{0}'")]
    UnknownPeriod(String),

    /// Formatted text exceeds the fixed row buffer.
    #[error("formatted output row needs {needed} bytes but the buffer holds {capacity}")]
    Capacity { needed: usize, capacity: usize },

    /// A key reached a dispatch branch that has no case for it.
    #[error("no {context} case for output key {key}")]
    Unhandled { key: OutKey, context: &'static str },

    /// More rows emitted than the in-memory arrays were sized for.
    #[error("row {row} exceeds the {nrow} rows allocated for {key}")]
    RowOverflow { key: OutKey, row: usize, nrow: usize },

    /// Inconsistent site or span description.
    #[error("invalid setup: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl OutputError {
    /// Severity of this error. Every returned error stops the current run.
    pub fn severity(&self) -> Severity {
        Severity::Fatal
    }
}

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Fatal => write!(f, "ERROR"),
        }
    }
}

/// One reported message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Collected warnings of one run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and forward it to the logger.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if any warning contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }
}
