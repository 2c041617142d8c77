use thiserror::Error;

#[derive(Debug, Error)]
pub enum OdmError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Type mismatch on field '{field}': expected {expected}, found {found}")]
    TypeMismatch { field: String, expected: String, found: String },

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Missing key: {0}")]
    MissingKey(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl OdmError {
    /// True for the lookup-miss family (`NotFound`), which `get_or_none` folds into `None`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
