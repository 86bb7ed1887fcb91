use thiserror::Error;

/// Failures surfaced to whoever issued a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("pitch is too short: {actual} characters, at least {min} required")]
    InvalidInput { min: usize, actual: usize },

    #[error("the reference index is still being built, try again shortly")]
    IndexNotReady,

    #[error("embedding the pitch failed, try again: {0}")]
    EmbeddingFailure(#[source] anyhow::Error),
}

impl QueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidInput { .. } => "InvalidInput",
            QueryError::IndexNotReady => "IndexNotReady",
            QueryError::EmbeddingFailure(_) => "EmbeddingFailure",
        }
    }
}

/// Failures of an assessor. Always recovered by the local rule table.
#[derive(Debug, Error)]
pub enum AssessError {
    #[error("assessment service unavailable: {0}")]
    Unavailable(String),
}
