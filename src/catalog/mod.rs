//! Catalog loading: symptom/disease index catalogs and the read-only
//! reference tables, built once from the CSV data directory.
//!
//! Every failure here is a deployment error. The service refuses to start
//! on any `CatalogError`.

pub mod index;
pub mod loader;
pub mod tables;

pub use index::*;
pub use loader::*;
pub use tables::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Data file not found: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing expected column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path} row {row}: invalid value '{value}' in column '{column}'")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Duplicate symptom name after normalization: '{0}'")]
    DuplicateSymptom(String),

    #[error("Outcome labels '{first}' and '{second}' differ only in surrounding whitespace")]
    AmbiguousDisease { first: String, second: String },

    #[error("Empty symptom name in column {0}")]
    EmptySymptomName(usize),

    #[error("Catalog is empty: {0}")]
    EmptyCatalog(String),
}

/// Canonical form for symptom names: underscores become spaces, outer
/// whitespace is dropped.
pub fn normalize_symptom_name(raw: &str) -> String {
    raw.replace('_', " ").trim().to_string()
}

/// Canonical form for disease-name keys across all reference tables.
pub fn normalize_disease_name(raw: &str) -> String {
    raw.trim().to_string()
}
