//! Error types for Tabnudge

use thiserror::Error;

/// Errors surfaced by the trigger engine and its collaborators
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid trigger catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Tab not found: {0}")]
    TabNotFound(i64),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Catalog loading errors. Any of these refuses engine start.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate trigger id: {0}")]
    DuplicateId(String),

    #[error("Trigger {id} of kind {kind} is missing required field `{field}`")]
    MissingField {
        id: String,
        kind: String,
        field: &'static str,
    },

    #[error("Trigger {id} has non-positive `{field}`")]
    NonPositive { id: String, field: &'static str },

    #[error("Trigger {id} is domain-scoped but has no domains")]
    EmptyDomains { id: String },

    #[error("Trigger {id} requires keywords but has none")]
    EmptyKeywords { id: String },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Key-value store failures. Transient: the evaluator degrades to a no-op.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Corrupt state record: {0}")]
    Corrupt(serde_json::Error),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
