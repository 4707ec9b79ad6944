use std::error::Error as StdError;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Failures that escape the query pipeline. Degradations the pipeline can
/// absorb (cascade stages, cache reads, speech) never reach this type.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("{0}")]
    Validation(String),

    #[error("AI service unavailable")]
    AiUnavailable(#[source] BoxError),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcription job {job} did not complete in {waited_secs}s")]
    TranscriptionTimeout {
        job: String,
        waited_secs: u64,
    },

    #[error("Storage error")]
    Storage(#[source] BoxError),
}

impl AgentError {
    pub fn validation(message: impl Into<String>) -> Self {
        AgentError::Validation(message.into())
    }
}
