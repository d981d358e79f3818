use std::collections::HashSet;

use encore_types::Request;
use encore_types::Vote;

/// Distinct participants who have interacted with a session
///
/// Cardinality of the union of every request submitter, every voter, the
/// host, and (on a join) the joining participant. Always a full
/// recomputation from the ledger, so the count can never drift the way an
/// incrementally bumped counter can; callers wanting a cached value snapshot
/// the result themselves.
pub fn crowd_size(host_id: &str, requests: &[Request], votes: &[Vote], joining: Option<&str>) -> u32 {
    let mut participants: HashSet<&str> = HashSet::new();
    participants.insert(host_id);

    for request in requests {
        participants.insert(request.submitter_id.as_str());
    }
    for vote in votes {
        participants.insert(vote.voter_id.as_str());
    }
    if let Some(joining) = joining {
        participants.insert(joining);
    }

    participants.len() as u32
}
