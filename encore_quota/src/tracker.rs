use std::sync::Arc;

use dashmap::DashMap;
use encore_types::ActionKind;
use parking_lot::Mutex;

use crate::error::Result;
use crate::policy::QuotaPolicy;
use crate::window::WindowLog;

/// Outcome of a quota check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaUsage {
    pub allowed: bool,

    /// Slots left in the window after this check
    pub remaining: u32,

    /// Whole seconds until the next slot frees; 0 unless the window is full
    pub reset_in_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct QuotaKey {
    session_code: String,
    participant_id: String,
    kind: ActionKind,
}

/// Sliding-window quota tracker keyed by (session, participant, kind)
///
/// Each key owns its own lock, so the prune-count-append sequence is atomic
/// per key and two rapid taps from the same participant can never both slip
/// past a full window. Different keys proceed fully in parallel.
pub struct QuotaTracker {
    policy: QuotaPolicy,
    windows: DashMap<QuotaKey, Arc<Mutex<WindowLog>>>,
}

impl QuotaTracker {
    pub fn new(policy: QuotaPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy, windows: DashMap::new() })
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Check the window for this key and consume one slot if one is free
    ///
    /// Denied checks leave no trace: the quota charge lands only on allowed
    /// attempts.
    pub fn check_and_consume(&self, session_code: &str, participant_id: &str, kind: ActionKind, now_ms: u64) -> QuotaUsage {
        let policy = self.policy.for_kind(kind);
        let window = self.window_for(session_code, participant_id, kind);
        let mut log = window.lock();

        log.prune(now_ms, policy.window_ms());

        if log.len() as u32 >= policy.limit {
            return QuotaUsage { allowed: false, remaining: 0, reset_in_seconds: log.reset_in_seconds(now_ms, policy.window_ms()) };
        }

        log.push(now_ms);
        QuotaUsage { allowed: true, remaining: policy.limit - log.len() as u32, reset_in_seconds: 0 }
    }

    /// Same prune-and-count as `check_and_consume`, without consuming
    ///
    /// Used by clients polling their remaining allowance and countdown.
    pub fn peek(&self, session_code: &str, participant_id: &str, kind: ActionKind, now_ms: u64) -> QuotaUsage {
        let policy = self.policy.for_kind(kind);
        let window = self.window_for(session_code, participant_id, kind);
        let mut log = window.lock();

        log.prune(now_ms, policy.window_ms());

        let count = log.len() as u32;
        if count >= policy.limit {
            QuotaUsage { allowed: false, remaining: 0, reset_in_seconds: log.reset_in_seconds(now_ms, policy.window_ms()) }
        } else {
            QuotaUsage { allowed: true, remaining: policy.limit - count, reset_in_seconds: 0 }
        }
    }

    fn window_for(&self, session_code: &str, participant_id: &str, kind: ActionKind) -> Arc<Mutex<WindowLog>> {
        let key = QuotaKey { session_code: session_code.to_owned(), participant_id: participant_id.to_owned(), kind };
        self.windows.entry(key).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::policy::KindPolicy;

    fn tracker() -> QuotaTracker {
        QuotaTracker::new(QuotaPolicy::default()).unwrap()
    }

    #[test]
    fn test_consume_until_limit() {
        let tracker = tracker();

        for remaining in (0..3).rev() {
            let usage = tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 0);
            assert!(usage.allowed);
            assert_eq!(usage.remaining, remaining);
            assert_eq!(usage.reset_in_seconds, 0);
        }

        let usage = tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 0);
        assert!(!usage.allowed);
        assert_eq!(usage.remaining, 0);
        assert_eq!(usage.reset_in_seconds, 300);
    }

    #[test]
    fn test_fifo_reset_timing() {
        let tracker = tracker();

        // Adds at t=0s, 1s, 2s fill the window
        for t in 0..3u64 {
            assert!(tracker.check_and_consume("ABC234", "p1", ActionKind::Add, t * 1_000).allowed);
        }

        // A 4th at t=10s is denied; the oldest slot frees at t=300s
        let usage = tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 10_000);
        assert!(!usage.allowed);
        assert_eq!(usage.reset_in_seconds, 290);

        // At t=301s the t=0s and t=1s entries have aged out
        let usage = tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 301_000);
        assert!(usage.allowed);
    }

    #[test]
    fn test_kinds_are_independent() {
        let tracker = tracker();

        // Exhaust downvotes (limit 1)
        assert!(tracker.check_and_consume("ABC234", "p1", ActionKind::Downvote, 0).allowed);
        assert!(!tracker.check_and_consume("ABC234", "p1", ActionKind::Downvote, 0).allowed);

        // Upvotes for the same key are untouched
        assert!(tracker.check_and_consume("ABC234", "p1", ActionKind::Upvote, 0).allowed);
    }

    #[test]
    fn test_keys_are_independent() {
        let tracker = tracker();

        for _ in 0..3 {
            assert!(tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 0).allowed);
        }
        assert!(!tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 0).allowed);

        // Another participant, and the same participant in another session, are unaffected
        assert!(tracker.check_and_consume("ABC234", "p2", ActionKind::Add, 0).allowed);
        assert!(tracker.check_and_consume("XYZ789", "p1", ActionKind::Add, 0).allowed);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let tracker = tracker();

        assert!(tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 0).allowed);

        for _ in 0..10 {
            let usage = tracker.peek("ABC234", "p1", ActionKind::Add, 0);
            assert!(usage.allowed);
            assert_eq!(usage.remaining, 2);
        }

        assert_eq!(tracker.peek("ABC234", "p1", ActionKind::Add, 0).remaining, 2);
    }

    #[test]
    fn test_peek_reports_countdown_when_exhausted() {
        let tracker = tracker();

        for _ in 0..3 {
            tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 0);
        }

        let usage = tracker.peek("ABC234", "p1", ActionKind::Add, 60_000);
        assert!(!usage.allowed);
        assert_eq!(usage.reset_in_seconds, 240);
    }

    #[test]
    fn test_denied_check_leaves_no_trace() {
        let tracker = tracker();

        for _ in 0..3 {
            tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 0);
        }
        for _ in 0..5 {
            assert!(!tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 1_000).allowed);
        }

        // Only the 3 allowed attempts occupy the window: all free by t=301s
        assert!(tracker.check_and_consume("ABC234", "p1", ActionKind::Add, 301_000).allowed);
        assert_eq!(tracker.peek("ABC234", "p1", ActionKind::Add, 301_000).remaining, 2);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut policy = QuotaPolicy::default();
        policy.add = KindPolicy::new(0, 300);
        assert!(QuotaTracker::new(policy).is_err());
    }

    #[test]
    fn test_concurrent_consumption_exact_limit() {
        use std::sync::Arc;

        let mut policy = QuotaPolicy::default();
        policy.upvote = KindPolicy::new(50, 300);
        let tracker = Arc::new(QuotaTracker::new(policy).unwrap());

        let mut handles = vec![];

        // 10 threads each fire 20 checks at the same key: 200 attempts, limit 50
        for _ in 0..10 {
            let tracker_clone = Arc::clone(&tracker);
            let handle = std::thread::spawn(move || {
                let mut allowed = 0u32;
                for _ in 0..20 {
                    if tracker_clone.check_and_consume("ABC234", "p1", ActionKind::Upvote, 0).allowed {
                        allowed += 1;
                    }
                }
                allowed
            });
            handles.push(handle);
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        // Exactly the limit slips through, never more
        assert_eq!(total, 50);
    }
}
