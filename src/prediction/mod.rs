//! Symptom → disease prediction pipeline.
//!
//! Request flow: `encoder` validates and encodes the symptom set, `engine`
//! runs the pre-trained classifier, the label resolves through the disease
//! catalog, then `aggregator` joins the reference tables. `service` owns the
//! loaded state and exposes the operations the HTTP layer calls.

pub mod aggregator;
pub mod encoder;
pub mod engine;
pub mod service;

pub use aggregator::*;
pub use encoder::*;
pub use engine::*;
pub use service::*;

use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Failed to load data files: {0}")]
    DataLoad(#[from] CatalogError),

    #[error("Inference model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("No symptoms provided")]
    EmptySymptoms,

    /// Every unrecognized name, in request order.
    #[error("Invalid symptoms: {}", .0.join(", "))]
    InvalidSymptoms(Vec<String>),

    #[error("Feature vector has {actual} entries, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model returned label {label}, disease catalog has {known} entries")]
    UnknownLabel { label: usize, known: usize },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
