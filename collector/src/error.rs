use thiserror::Error;

/// Failures of a single API or transcript call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited or quota exceeded (HTTP {status}): {message}")]
    RateLimited { status: u16, message: String },
    #[error("video {0} not found")]
    NotFound(String),
    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Where in the collection loop a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Details,
    Transcript,
}

/// What the collector does about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Sleep the backoff interval, then retry the current page.
    RetryWithBackoff,
    /// Drop the video; the batch continues.
    SkipRecord,
    /// Keep the video, leave the failed field empty.
    SkipField,
    /// Write a checkpoint and end the search with an error.
    AbortAndCheckpoint,
}

impl FetchError {
    pub fn policy(&self, stage: Stage) -> Policy {
        match (stage, self) {
            (Stage::Transcript, _) => Policy::SkipField,
            (_, FetchError::RateLimited { .. }) => Policy::RetryWithBackoff,
            (Stage::Details, _) => Policy::SkipRecord,
            (Stage::Search, _) => Policy::AbortAndCheckpoint,
        }
    }

    /// HTTP statuses the API uses for quota exhaustion and throttling.
    pub fn is_rate_limit_status(status: u16) -> bool {
        matches!(status, 403 | 429)
    }
}
