//! Reference-table load errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the reference tables.
///
/// All of these are fatal: the gate never starts without reference data.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open reference table {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse reference table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Reference table {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },
}
