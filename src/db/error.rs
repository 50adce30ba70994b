use thiserror::Error;

/// Store failure carrying the underlying driver's message verbatim.
///
/// No distinction is made between constraint violations, connectivity
/// failures, or malformed input; the caller forwards the message as-is.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Query(String),

    #[error("{0}")]
    Migration(String),
}
