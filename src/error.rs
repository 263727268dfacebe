use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum ShoplistError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A local lookup missed (e.g. an item id that is not loaded).
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required id or reference was absent; no backend call was made.
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// The backend answered, but rejected the request.
    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
}

pub type Result<T> = std::result::Result<T, ShoplistError>;
