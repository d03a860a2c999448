use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid modality: {0}")]
    InvalidModality(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Ingest requires at least one vector")]
    EmptyIngestVectors,

    #[error("Dimension mismatch for '{modality}': expected {expected}, got {actual}")]
    DimensionMismatch { modality: String, expected: usize, actual: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Request errors are the caller's fault; everything else is a service error.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidModality(_)
                | Error::Embedding(_)
                | Error::EmptyIngestVectors
                | Error::DimensionMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
