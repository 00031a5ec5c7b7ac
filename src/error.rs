//! Error types for the analysis kernel

use thiserror::Error;

/// Errors raised while validating or preparing a model for analysis.
///
/// Solver-level outcomes (singular systems, eigensolver divergence) are not
/// errors: they are reported through the status field of the result records,
/// so a failed solve still hands back whatever is useful for debugging.
#[derive(Error, Debug)]
pub enum KernelError {
    #[error("node {0} not found in model")]
    NodeNotFound(i64),

    #[error("element {0} not found in model")]
    ElementNotFound(i64),

    #[error("material {0} not found in model")]
    MaterialNotFound(i64),

    #[error("section {0} not found in model")]
    SectionNotFound(i64),

    #[error("duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: i64 },

    #[error("load combination '{0}' not found in model")]
    CombinationNotFound(String),

    #[error("empty model: {0}")]
    EmptyModel(&'static str),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid property: {0}")]
    InvalidProperty(String),

    #[error("invalid load: {0}")]
    InvalidLoad(String),

    #[error("invalid spectrum: {0}")]
    InvalidSpectrum(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;
