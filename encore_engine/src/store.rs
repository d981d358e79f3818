use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use encore_types::Request;
use encore_types::Session;
use encore_types::Vote;

/// Persistence seam for sessions, requests, and the vote ledger
///
/// The engine only needs point lookup, append, and an atomic
/// read-modify-write per record, so any keyed store with those primitives
/// can back it. `with_request` runs the closure under the record's own
/// lock; a vote's check-then-adjust sequence happens entirely inside it.
pub trait SessionStore: Send + Sync {
    /// Insert a session; fails when the code is already taken
    fn insert_session(&self, session: Session) -> bool;

    fn get_session(&self, code: &str) -> Option<Session>;

    /// Mutate a session under its record lock; false when absent
    fn with_session(&self, code: &str, f: &mut dyn FnMut(&mut Session)) -> bool;

    fn insert_request(&self, request: Request);

    fn get_request(&self, id: u64) -> Option<Request>;

    /// Mutate a request under its record lock; false when absent
    ///
    /// The closure must not call back into ledger scans on the same store.
    fn with_request(&self, id: u64, f: &mut dyn FnMut(&mut Request)) -> bool;

    /// All requests for a session, removed ones included
    fn session_requests(&self, code: &str) -> Vec<Request>;

    /// Append to the session's immutable vote ledger
    fn append_vote(&self, code: &str, vote: Vote);

    fn session_votes(&self, code: &str) -> Vec<Vote>;
}

/// In-memory store over sharded concurrent maps
///
/// Records are never physically deleted while a session lives; soft flags
/// carry the lifecycle. Requests are indexed per session so queue reads
/// stay a point lookup rather than a full scan.
#[derive(Default)]
pub struct MemoryStore {
    sessions: DashMap<String, Session>,
    requests: DashMap<u64, Request>,
    session_index: DashMap<String, Vec<u64>>,
    votes: DashMap<String, Vec<Vote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn insert_session(&self, session: Session) -> bool {
        match self.sessions.entry(session.code.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(session);
                true
            }
        }
    }

    fn get_session(&self, code: &str) -> Option<Session> {
        self.sessions.get(code).map(|entry| entry.clone())
    }

    fn with_session(&self, code: &str, f: &mut dyn FnMut(&mut Session)) -> bool {
        match self.sessions.get_mut(code) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    fn insert_request(&self, request: Request) {
        self.session_index.entry(request.session_code.clone()).or_default().push(request.id);
        self.requests.insert(request.id, request);
    }

    fn get_request(&self, id: u64) -> Option<Request> {
        self.requests.get(&id).map(|entry| entry.clone())
    }

    fn with_request(&self, id: u64, f: &mut dyn FnMut(&mut Request)) -> bool {
        match self.requests.get_mut(&id) {
            Some(mut entry) => {
                f(entry.value_mut());
                true
            }
            None => false,
        }
    }

    fn session_requests(&self, code: &str) -> Vec<Request> {
        let ids = match self.session_index.get(code) {
            Some(entry) => entry.clone(),
            None => return Vec::new(),
        };
        ids.iter().filter_map(|id| self.requests.get(id).map(|entry| entry.clone())).collect()
    }

    fn append_vote(&self, code: &str, vote: Vote) {
        self.votes.entry(code.to_owned()).or_default().push(vote);
    }

    fn session_votes(&self, code: &str) -> Vec<Vote> {
        self.votes.get(code).map(|entry| entry.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use encore_types::VoteDirection;

    #[test]
    fn test_session_code_collision_rejected() {
        let store = MemoryStore::new();

        assert!(store.insert_session(Session::new("ABC234".into(), "host".into(), 0)));
        assert!(!store.insert_session(Session::new("ABC234".into(), "other".into(), 0)));

        assert_eq!(store.get_session("ABC234").unwrap().host_id, "host");
    }

    #[test]
    fn test_request_roundtrip_and_index() {
        let store = MemoryStore::new();
        store.insert_request(Request::new(1, "ABC234".into(), "p1".into(), "Song".into(), "Artist".into(), 0));
        store.insert_request(Request::new(2, "ABC234".into(), "p2".into(), "Other".into(), "Artist".into(), 5));
        store.insert_request(Request::new(3, "XYZ789".into(), "p3".into(), "Third".into(), "Artist".into(), 9));

        assert_eq!(store.session_requests("ABC234").len(), 2);
        assert_eq!(store.session_requests("XYZ789").len(), 1);
        assert!(store.session_requests("QQQQQQ").is_empty());
        assert_eq!(store.get_request(2).unwrap().submitter_id, "p2");
    }

    #[test]
    fn test_with_request_mutates_in_place() {
        let store = MemoryStore::new();
        store.insert_request(Request::new(1, "ABC234".into(), "p1".into(), "Song".into(), "Artist".into(), 0));

        assert!(store.with_request(1, &mut |req| req.votes += 1));
        assert_eq!(store.get_request(1).unwrap().votes, 2);

        assert!(!store.with_request(99, &mut |_| {}));
    }

    #[test]
    fn test_vote_ledger_is_append_only() {
        let store = MemoryStore::new();
        store.append_vote("ABC234", Vote { request_id: 1, voter_id: "p2".into(), direction: VoteDirection::Up, cast_at_ms: 10 });
        store.append_vote("ABC234", Vote { request_id: 1, voter_id: "p3".into(), direction: VoteDirection::Down, cast_at_ms: 20 });

        let votes = store.session_votes("ABC234");
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].voter_id, "p2");
        assert_eq!(votes[1].voter_id, "p3");
        assert!(store.session_votes("XYZ789").is_empty());
    }
}
