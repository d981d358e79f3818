use anyhow::Result;
use encore_app::config_loader;
use encore_engine::EngineError;
use encore_engine::MemoryStore;
use encore_engine::SessionRegistry;
use encore_types::VoteDirection;
use tracing::info;
use tracing::warn;

/// Drives one scripted session through the engine end to end: create, join,
/// add requests, vote, hit the quota wall, remove a request, end the
/// session. Stands in for a transport layer while exercising every engine
/// operation.
fn main() -> Result<()> {
    let _guard = encore_app::tracing_setup::init("encore_sim", "./logs", tracing::Level::INFO, true);

    let config_file = config_loader::load_engine_config_or_default("config/encore.toml");
    let venue = config_file.venue_name.unwrap_or_else(|| "encore demo".to_string());
    info!("Starting session simulator for {venue}");

    let registry = SessionRegistry::new(MemoryStore::new(), config_file.registry)?;

    let session = registry.create_session("dj")?;
    let code = session.code.clone();
    info!(code = %code, "session open, tell the room");

    for participant in ["alice", "bob", "carol"] {
        let joined = registry.join(&code, participant)?;
        info!(participant, crowd = joined.crowd, "joined");
    }

    let first = registry.add_request(&code, "alice", "Dog Days Are Over", "Florence + The Machine")?;
    let second = registry.add_request(&code, "bob", "Midnight City", "M83")?;
    let third = registry.add_request(&code, "carol", "On Melancholy Hill", "Gorillaz")?;

    registry.apply_vote(second.id, "alice", VoteDirection::Up)?;
    registry.apply_vote(second.id, "carol", VoteDirection::Up)?;
    registry.apply_vote(first.id, "carol", VoteDirection::Down)?;

    // Downvotes are scarce: carol already spent her one allowance
    match registry.apply_vote(second.id, "carol", VoteDirection::Down) {
        Ok(request) => info!(request = request.id, votes = request.votes, "vote landed"),
        Err(EngineError::QuotaExceeded { reset_in_seconds, .. }) => {
            warn!(reset_in_seconds, "carol is out of downvotes");
        }
        Err(err) => return Err(err.into()),
    }

    // Self-votes are rejected outright
    if let Err(err) = registry.apply_vote(first.id, "alice", VoteDirection::Up) {
        warn!(%err, "alice tried to vote for her own request");
    }

    let usage = registry.vote_usage(&code, "carol")?;
    info!(upvotes_left = usage.upvotes_left, downvotes_left = usage.downvotes_left, "carol's remaining allowance");

    // The DJ drops a request; its submitter's quota charge stands
    registry.remove_request(&code, third.id, "dj")?;

    info!(crowd = registry.crowd_size(&code)?, "final crowd");
    for (position, request) in registry.queue(&code)?.iter().enumerate() {
        info!(
            position = position + 1,
            votes = request.display_votes(registry.vote_floor()),
            "{} - {}",
            request.song_title,
            request.artist
        );
    }

    registry.end_session(&code, "dj")?;
    info!(code = %code, "session ended, queue stays readable for the recap");

    Ok(())
}
