/// Sliding-window log of consumption timestamps for one quota key
///
/// Timestamps are appended in consumption order and pruned lazily on every
/// read, so the log never needs background eviction: a read always prunes
/// before deciding the window's length. Resets are first-in-first-out (the
/// window frees a slot when its oldest surviving entry ages out), not a
/// fixed calendar boundary.
#[derive(Debug, Default)]
pub(crate) struct WindowLog {
    /// Consumption timestamps in milliseconds, ascending
    stamps: Vec<u64>,
}

impl WindowLog {
    /// Drop entries that have aged out of the window
    ///
    /// Idempotent and safe to run on every read. An entry at exactly
    /// `now - window` has aged out: its slot is free again.
    pub fn prune(&mut self, now_ms: u64, window_ms: u64) {
        self.stamps.retain(|&stamp| stamp + window_ms > now_ms);
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn push(&mut self, now_ms: u64) {
        self.stamps.push(now_ms);
    }

    /// Whole seconds until the oldest surviving entry ages out
    ///
    /// Rounded up so a caller that waits the returned number of seconds is
    /// guaranteed a free slot. Zero when the log is empty.
    pub fn reset_in_seconds(&self, now_ms: u64, window_ms: u64) -> u64 {
        match self.stamps.first() {
            Some(&oldest) => {
                let remaining_ms = (oldest + window_ms).saturating_sub(now_ms);
                remaining_ms.div_ceil(1_000)
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const WINDOW_MS: u64 = 300_000;

    #[test]
    fn test_prune_drops_aged_entries() {
        let mut log = WindowLog::default();
        log.push(0);
        log.push(1_000);
        log.push(2_000);

        // At t=301s, entries at t=0s and t=1s have aged out of a 300s window
        log.prune(301_000, WINDOW_MS);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut log = WindowLog::default();
        log.push(10_000);
        log.push(20_000);

        log.prune(50_000, WINDOW_MS);
        assert_eq!(log.len(), 2);
        log.prune(50_000, WINDOW_MS);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_entry_at_exact_boundary_is_free() {
        let mut log = WindowLog::default();
        log.push(0);

        log.prune(WINDOW_MS, WINDOW_MS);
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_reset_counts_from_oldest_survivor() {
        let mut log = WindowLog::default();
        log.push(0);
        log.push(1_000);
        log.push(2_000);

        // At t=10s the oldest entry frees at t=300s: 290s to go
        log.prune(10_000, WINDOW_MS);
        assert_eq!(log.reset_in_seconds(10_000, WINDOW_MS), 290);
    }

    #[test]
    fn test_reset_rounds_up_to_whole_second() {
        let mut log = WindowLog::default();
        log.push(500);

        // Frees at 300.5s; at t=10s that is 290.5s away, reported as 291
        assert_eq!(log.reset_in_seconds(10_000, WINDOW_MS), 291);
    }

    #[test]
    fn test_reset_zero_when_empty() {
        let log = WindowLog::default();
        assert_eq!(log.reset_in_seconds(10_000, WINDOW_MS), 0);
    }

    #[test]
    fn test_reset_floored_at_zero() {
        let mut log = WindowLog::default();
        log.push(0);
        // Past the boundary without pruning first
        assert_eq!(log.reset_in_seconds(WINDOW_MS + 5_000, WINDOW_MS), 0);
    }

    proptest! {
        #[test]
        fn prop_prune_keeps_only_in_window(stamps in proptest::collection::vec(0u64..1_000_000, 0..64), now in 0u64..2_000_000) {
            let mut sorted = stamps.clone();
            sorted.sort_unstable();

            let mut log = WindowLog::default();
            for stamp in &sorted {
                log.push(*stamp);
            }
            log.prune(now, WINDOW_MS);

            let expected = sorted.iter().filter(|&&s| s + WINDOW_MS > now).count();
            prop_assert_eq!(log.len(), expected);
        }

        #[test]
        fn prop_reset_never_exceeds_window(stamps in proptest::collection::vec(0u64..1_000_000, 1..64), ahead in 0u64..400_000) {
            let mut sorted = stamps.clone();
            sorted.sort_unstable();
            // Entries are always appended at or before "now"
            let now = 1_000_000 + ahead;

            let mut log = WindowLog::default();
            for stamp in &sorted {
                log.push(*stamp);
            }
            log.prune(now, WINDOW_MS);

            let reset = log.reset_in_seconds(now, WINDOW_MS);
            prop_assert!(reset <= WINDOW_MS / 1_000);
        }
    }
}
