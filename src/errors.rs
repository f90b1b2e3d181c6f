//! Error types for loading and linking.

use std::path::PathBuf;
use thiserror::Error;

/// A failure that aborts a whole load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("json error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} has no `{column}` column")]
    MissingColumn { path: PathBuf, column: &'static str },
    #[error("{path} does not list a `{field}` field")]
    MissingField { path: PathBuf, field: &'static str },
}

/// Why a single input row was skipped. The load itself continues.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("unreadable record: {0}")]
    Unreadable(String),
    #[error("blank designation")]
    MissingDesignation,
    #[error("expected at least {expected} values, found {found}")]
    TooShort { expected: usize, found: usize },
    #[error("bad calendar date {value:?}: {source}")]
    BadDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// A row that was dropped during a load, with its 1-based data row number.
#[derive(Debug)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: RowError,
}

/// Raised while linking approaches to NEOs.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("close approach references unknown designation {designation:?}")]
    Orphan { designation: String },
}
