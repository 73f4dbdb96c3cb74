/// GridTable error type
///
/// Data-shape problems never surface here: malformed cells, unparseable filter
/// text and odd record sets all degrade to a safe fallback inside the engine.
/// What remains are caller mistakes and failures at the ingestion boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridError {
    /// A sort key names a column that is not part of the dataset.
    #[error("Sort column '{0}' not found in table")]
    UnknownSortColumn(String),

    /// A page with zero rows was requested.
    #[error("Page size must be at least 1")]
    InvalidPage,

    /// The input text was not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GridError>;
