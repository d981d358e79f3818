use std::cmp::Reverse;

use encore_types::Request;

/// Reasons a vote is inadmissible before any quota is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteCheckError {
    /// The voter submitted this request themselves
    SelfVote,

    /// The request is absent or soft-deleted
    NotFound,
}

/// Rank a session's requests for display
///
/// Vote counter descending, ties broken by earliest creation (the first
/// submission of a tied song stays visible on top), then by id so the
/// ordering is total. Removed requests are excluded entirely but stay in
/// storage.
pub fn rank(requests: &[Request]) -> Vec<Request> {
    let mut ranked: Vec<Request> = requests.iter().filter(|r| !r.removed).cloned().collect();
    ranked.sort_by_key(|r| (Reverse(r.votes), r.created_at_ms, r.id));
    ranked
}

/// Admissibility check for a vote, run before any quota is consumed
///
/// Self-votes are rejected outright, not merely un-rewarded; a removed
/// request is indistinguishable from an absent one.
pub fn check_vote(request: Option<&Request>, voter_id: &str) -> Result<(), VoteCheckError> {
    let request = match request {
        Some(r) if !r.removed => r,
        _ => return Err(VoteCheckError::NotFound),
    };

    if request.submitter_id == voter_id {
        return Err(VoteCheckError::SelfVote);
    }

    Ok(())
}
