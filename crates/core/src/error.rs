//! Error types shared by the dialogue engine and its collaborators

use thiserror::Error;

/// Errors raised by the engine or surfaced from external collaborators
#[derive(Error, Debug)]
pub enum Error {
    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Generator error: {0}")]
    Generator(String),

    #[error("Store error: {0}")]
    Store(String),

    /// A save carried a revision older than the stored record
    #[error("Stale write for session {id}: expected revision {expected}, got {actual}")]
    StaleSession {
        id: String,
        expected: u64,
        actual: u64,
    },

    #[error("Rule error: {0}")]
    Rule(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;
