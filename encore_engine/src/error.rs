use thiserror::Error;

/// Typed engine results; nothing is retried or swallowed inside the engine
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("session or request not found")]
    NotFound,

    #[error("participants cannot vote on their own request")]
    SelfVote,

    #[error("quota exceeded, next slot frees in {reset_in_seconds}s")]
    QuotaExceeded { remaining: u32, reset_in_seconds: u64 },

    #[error("session has ended")]
    SessionEnded,

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

pub type Result<T> = std::result::Result<T, EngineError>;
