use std::fmt;

/// Result type for quota operations
pub type Result<T> = std::result::Result<T, QuotaError>;

/// Errors that can occur when configuring the quota tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaError {
    /// Invalid policy configuration
    InvalidPolicy(&'static str),
}

impl fmt::Display for QuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaError::InvalidPolicy(msg) => write!(f, "Invalid quota policy: {}", msg),
        }
    }
}

impl std::error::Error for QuotaError {}
