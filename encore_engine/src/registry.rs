use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use encore_queue::VoteCheckError;
use encore_queue::check_vote;
use encore_queue::crowd_size;
use encore_queue::rank;
use encore_quota::Clock;
use encore_quota::QuotaPolicy;
use encore_quota::QuotaTracker;
use encore_quota::SystemClock;
use encore_types::ActionKind;
use encore_types::DEFAULT_VOTE_FLOOR;
use encore_types::Request;
use encore_types::Session;
use encore_types::SessionStatus;
use encore_types::Vote;
use encore_types::VoteDirection;
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::codes;
use crate::error::EngineError;
use crate::error::Result;
use crate::store::SessionStore;

/// Registry configuration
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Per-kind quota limits and windows
    pub quota: QuotaPolicy,

    /// Session code length
    pub code_length: usize,

    /// Floor for the UI-facing vote count
    pub vote_floor: i32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { quota: QuotaPolicy::default(), code_length: codes::DEFAULT_CODE_LENGTH, vote_floor: DEFAULT_VOTE_FLOOR }
    }
}

/// Remaining add allowance for one participant in one session
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct AddUsageReport {
    pub adds_left: u32,
    pub add_reset_seconds: u64,
}

/// Remaining vote allowances for one participant in one session
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct VoteUsageReport {
    pub upvotes_left: u32,
    pub upvote_reset_seconds: u64,
    pub downvotes_left: u32,
    pub downvote_reset_seconds: u64,
}

/// Coordinates sessions, quota enforcement, the ranked queue, and the crowd
/// snapshot over an injected store and clock
///
/// Every mutation endpoint checks session status first, then charges quota,
/// then mutates, so a rejected operation leaves no quota entry, no vote
/// record, and no counter change.
pub struct SessionRegistry<S: SessionStore, C: Clock = SystemClock> {
    store: S,
    quota: QuotaTracker,
    clock: C,
    code_length: usize,
    vote_floor: i32,
    next_request_id: AtomicU64,
    rng: Mutex<StdRng>,
}

impl<S: SessionStore> SessionRegistry<S, SystemClock> {
    pub fn new(store: S, config: RegistryConfig) -> Result<Self> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: SessionStore, C: Clock> SessionRegistry<S, C> {
    pub fn with_clock(store: S, config: RegistryConfig, clock: C) -> Result<Self> {
        if config.code_length == 0 {
            return Err(EngineError::InvalidInput("code length must be greater than 0"));
        }

        let quota = QuotaTracker::new(config.quota).map_err(|err| match err {
            encore_quota::QuotaError::InvalidPolicy(msg) => EngineError::InvalidInput(msg),
        })?;

        Ok(Self {
            store,
            quota,
            clock,
            code_length: config.code_length,
            vote_floor: config.vote_floor,
            next_request_id: AtomicU64::new(1),
            rng: Mutex::new(StdRng::from_os_rng()),
        })
    }

    pub fn vote_floor(&self) -> i32 {
        self.vote_floor
    }

    /// Open a session under a freshly drawn unique code
    pub fn create_session(&self, host_id: &str) -> Result<Session> {
        if host_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("participant id is required"));
        }

        let now_ms = self.clock.now_ms();
        let mut length = self.code_length;
        let mut attempts = 0usize;

        loop {
            let code = {
                let mut rng = self.rng.lock();
                codes::generate_code(&mut *rng, length)
            };

            let session = Session::new(code, host_id.to_owned(), now_ms);
            if self.store.insert_session(session.clone()) {
                info!(code = %session.code, host = %host_id, "session created");
                return Ok(session);
            }

            // Expected O(1) retries given 32^6 codes; grow the code if the
            // space ever saturates so the loop always terminates
            attempts += 1;
            if attempts % codes::CODE_ALPHABET.len() == 0 {
                length += 1;
                warn!(attempts, length, "session code space congested, growing code length");
            }
        }
    }

    /// Look up a session by code; ended sessions stay resolvable
    pub fn resolve(&self, code: &str) -> Result<Session> {
        self.store.get_session(code).ok_or(EngineError::NotFound)
    }

    /// Join a live session, refreshing its crowd snapshot
    pub fn join(&self, code: &str, participant_id: &str) -> Result<Session> {
        if participant_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("participant id is required"));
        }

        let session = self.resolve(code)?;
        if !session.is_live() {
            return Err(EngineError::SessionEnded);
        }

        let crowd = self.recompute_crowd(code, &session.host_id, Some(participant_id));
        self.store.with_session(code, &mut |s| s.crowd = crowd);
        debug!(code = %code, participant = %participant_id, crowd, "participant joined");

        self.resolve(code)
    }

    /// One-way `live -> ended` transition, host only
    pub fn end_session(&self, code: &str, caller_id: &str) -> Result<Session> {
        let session = self.resolve(code)?;
        if session.host_id != caller_id {
            // Codes are capabilities; non-hosts learn nothing
            return Err(EngineError::NotFound);
        }

        let mut transitioned = false;
        self.store.with_session(code, &mut |s| {
            if s.status == SessionStatus::Live {
                s.status = SessionStatus::Ended;
                transitioned = true;
            }
        });

        if !transitioned {
            return Err(EngineError::SessionEnded);
        }

        info!(code = %code, "session ended");
        self.resolve(code)
    }

    /// Submit a song request, charging one add-quota slot
    pub fn add_request(&self, code: &str, participant_id: &str, song_title: &str, artist: &str) -> Result<Request> {
        if participant_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("participant id is required"));
        }
        if song_title.trim().is_empty() {
            return Err(EngineError::InvalidInput("song title is required"));
        }
        if artist.trim().is_empty() {
            return Err(EngineError::InvalidInput("artist is required"));
        }

        let session = self.resolve(code)?;
        if !session.is_live() {
            return Err(EngineError::SessionEnded);
        }

        let now_ms = self.clock.now_ms();
        let usage = self.quota.check_and_consume(code, participant_id, ActionKind::Add, now_ms);
        if !usage.allowed {
            warn!(code = %code, participant = %participant_id, reset_in_seconds = usage.reset_in_seconds, "add quota exceeded");
            return Err(EngineError::QuotaExceeded { remaining: 0, reset_in_seconds: usage.reset_in_seconds });
        }

        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let request = Request::new(id, code.to_owned(), participant_id.to_owned(), song_title.to_owned(), artist.to_owned(), now_ms);
        self.store.insert_request(request.clone());
        self.refresh_crowd(code, &session.host_id);

        debug!(code = %code, request = id, participant = %participant_id, adds_left = usage.remaining, "request added");
        Ok(request)
    }

    /// Cast a vote: append to the ledger and adjust the request's counter
    ///
    /// This is the only mutation path for vote counters. The admissibility
    /// check, the quota charge, and the counter adjustment all happen under
    /// the request's record lock, so a request removed mid-flight can never
    /// be charged for.
    pub fn apply_vote(&self, request_id: u64, participant_id: &str, direction: VoteDirection) -> Result<Request> {
        if participant_id.trim().is_empty() {
            return Err(EngineError::InvalidInput("participant id is required"));
        }

        let request = self.store.get_request(request_id).ok_or(EngineError::NotFound)?;
        let session = self.resolve(&request.session_code)?;
        if !session.is_live() {
            return Err(EngineError::SessionEnded);
        }

        let now_ms = self.clock.now_ms();
        let mut outcome: Result<Request> = Err(EngineError::NotFound);
        self.store.with_request(request_id, &mut |req| {
            outcome = self.vote_under_lock(req, participant_id, direction, now_ms);
        });

        let updated = outcome?;
        self.refresh_crowd(&updated.session_code, &session.host_id);

        debug!(request = request_id, participant = %participant_id, direction = ?direction, votes = updated.votes, "vote applied");
        Ok(updated)
    }

    fn vote_under_lock(&self, request: &mut Request, voter_id: &str, direction: VoteDirection, now_ms: u64) -> Result<Request> {
        match check_vote(Some(request), voter_id) {
            Ok(()) => {}
            Err(VoteCheckError::SelfVote) => return Err(EngineError::SelfVote),
            Err(VoteCheckError::NotFound) => return Err(EngineError::NotFound),
        }

        let usage = self.quota.check_and_consume(&request.session_code, voter_id, direction.kind(), now_ms);
        if !usage.allowed {
            return Err(EngineError::QuotaExceeded { remaining: 0, reset_in_seconds: usage.reset_in_seconds });
        }

        request.votes += direction.delta();
        let vote = Vote { request_id: request.id, voter_id: voter_id.to_owned(), direction, cast_at_ms: now_ms };
        self.store.append_vote(&request.session_code, vote);

        Ok(request.clone())
    }

    /// Soft-delete a request, host only; the submitter's quota is not
    /// refunded (the charge paid for the attempt)
    pub fn remove_request(&self, code: &str, request_id: u64, caller_id: &str) -> Result<()> {
        let session = self.resolve(code)?;
        if session.host_id != caller_id {
            return Err(EngineError::NotFound);
        }
        if !session.is_live() {
            return Err(EngineError::SessionEnded);
        }

        let mut removed = false;
        self.store.with_request(request_id, &mut |req| {
            if req.session_code == code && !req.removed {
                req.removed = true;
                removed = true;
            }
        });

        if !removed {
            return Err(EngineError::NotFound);
        }

        info!(code = %code, request = request_id, "request removed");
        Ok(())
    }

    /// Vote-ranked queue, removed requests excluded; readable after the
    /// session ends
    pub fn queue(&self, code: &str) -> Result<Vec<Request>> {
        self.resolve(code)?;
        Ok(rank(&self.store.session_requests(code)))
    }

    /// Remaining add allowance and countdown, without consuming
    pub fn add_usage(&self, code: &str, participant_id: &str) -> Result<AddUsageReport> {
        self.resolve(code)?;
        let usage = self.quota.peek(code, participant_id, ActionKind::Add, self.clock.now_ms());
        Ok(AddUsageReport { adds_left: usage.remaining, add_reset_seconds: usage.reset_in_seconds })
    }

    /// Remaining vote allowances and countdowns, without consuming
    pub fn vote_usage(&self, code: &str, participant_id: &str) -> Result<VoteUsageReport> {
        self.resolve(code)?;
        let now_ms = self.clock.now_ms();
        let up = self.quota.peek(code, participant_id, ActionKind::Upvote, now_ms);
        let down = self.quota.peek(code, participant_id, ActionKind::Downvote, now_ms);
        Ok(VoteUsageReport {
            upvotes_left: up.remaining,
            upvote_reset_seconds: up.reset_in_seconds,
            downvotes_left: down.remaining,
            downvote_reset_seconds: down.reset_in_seconds,
        })
    }

    /// Distinct participants who have interacted with the session
    pub fn crowd_size(&self, code: &str) -> Result<u32> {
        let session = self.resolve(code)?;
        Ok(self.recompute_crowd(code, &session.host_id, None))
    }

    fn recompute_crowd(&self, code: &str, host_id: &str, joining: Option<&str>) -> u32 {
        let requests = self.store.session_requests(code);
        let votes = self.store.session_votes(code);
        crowd_size(host_id, &requests, &votes, joining)
    }

    fn refresh_crowd(&self, code: &str, host_id: &str) {
        let crowd = self.recompute_crowd(code, host_id, None);
        self.store.with_session(code, &mut |s| s.crowd = crowd);
    }
}
