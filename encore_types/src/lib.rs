//! # encore_types
//!
//! Shared domain types for the encore session engine

use serde::Deserialize;
use serde::Serialize;

/// Every new request starts with one net vote (the submitter's implicit vote)
pub const VOTE_SEED: i32 = 1;

/// Floor applied to the UI-facing vote count; the ledger counter is unclamped
pub const DEFAULT_VOTE_FLOOR: i32 = 0;

/// Quota-limited action kinds, each with its own limit and window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Add,
    Upvote,
    Downvote,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Upvote => "upvote",
            ActionKind::Downvote => "downvote",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a cast vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Quota kind charged for a vote in this direction
    pub fn kind(self) -> ActionKind {
        match self {
            VoteDirection::Up => ActionKind::Upvote,
            VoteDirection::Down => ActionKind::Downvote,
        }
    }

    /// Signed adjustment applied to the request's vote counter
    pub fn delta(self) -> i32 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

/// Session lifecycle; `Ended` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Live,
    Ended,
}

/// One live event, identified by its short join code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique among currently-live sessions
    pub code: String,
    pub host_id: String,
    pub status: SessionStatus,
    pub created_at_ms: u64,
    /// Cached crowd snapshot, refreshed on join and after mutating actions
    pub crowd: u32,
}

impl Session {
    pub fn new(code: String, host_id: String, created_at_ms: u64) -> Self {
        // The host counts as crowd from the moment the session opens
        Self { code, host_id, status: SessionStatus::Live, created_at_ms, crowd: 1 }
    }

    pub fn is_live(&self) -> bool {
        self.status == SessionStatus::Live
    }
}

/// A submitted song, ranked by net votes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    pub session_code: String,
    pub submitter_id: String,
    pub song_title: String,
    pub artist: String,
    /// Unclamped ledger counter: seed + upvotes - downvotes
    pub votes: i32,
    pub created_at_ms: u64,
    /// Soft-delete flag, set only by the session host
    pub removed: bool,
}

impl Request {
    pub fn new(id: u64, session_code: String, submitter_id: String, song_title: String, artist: String, created_at_ms: u64) -> Self {
        Self { id, session_code, submitter_id, song_title, artist, votes: VOTE_SEED, created_at_ms, removed: false }
    }

    /// UI-facing vote count, clamped at the given floor
    pub fn display_votes(&self, floor: i32) -> i32 {
        self.votes.max(floor)
    }
}

/// Immutable vote fact, append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub request_id: u64,
    pub voter_id: String,
    pub direction: VoteDirection,
    pub cast_at_ms: u64,
}
