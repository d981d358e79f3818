use encore_types::ActionKind;

use crate::error::QuotaError;
use crate::error::Result;

/// Limit and rolling window for one action kind
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct KindPolicy {
    /// Maximum actions allowed inside the window
    pub limit: u32,

    /// Rolling window length in seconds
    pub window_seconds: u64,
}

impl KindPolicy {
    pub fn new(limit: u32, window_seconds: u64) -> Self {
        Self { limit, window_seconds }
    }

    pub(crate) fn window_ms(&self) -> u64 {
        self.window_seconds * 1_000
    }
}

/// Per-kind quota policy for a session engine
///
/// Each kind carries its own independent limit and window; defaults match
/// a small club session where a handful of adds and upvotes per five
/// minutes keeps one table from drowning out the room.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct QuotaPolicy {
    pub add: KindPolicy,
    pub upvote: KindPolicy,
    pub downvote: KindPolicy,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            add: KindPolicy::new(3, 300),      // 3 song requests per 5 minutes
            upvote: KindPolicy::new(3, 300),   // 3 upvotes per 5 minutes
            downvote: KindPolicy::new(1, 300), // downvotes are deliberately scarce
        }
    }
}

impl QuotaPolicy {
    /// Policy constants for one action kind
    pub fn for_kind(&self, kind: ActionKind) -> KindPolicy {
        match kind {
            ActionKind::Add => self.add,
            ActionKind::Upvote => self.upvote,
            ActionKind::Downvote => self.downvote,
        }
    }

    /// Check that every kind has a usable limit and window
    pub fn validate(&self) -> Result<()> {
        for policy in [self.add, self.upvote, self.downvote] {
            if policy.limit == 0 {
                return Err(QuotaError::InvalidPolicy("limit must be greater than 0"));
            }
            if policy.window_seconds == 0 {
                return Err(QuotaError::InvalidPolicy("window must be greater than 0"));
            }
        }
        Ok(())
    }
}
