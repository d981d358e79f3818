pub mod crowd;
pub mod ranker;

pub use crowd::crowd_size;
pub use ranker::VoteCheckError;
pub use ranker::check_vote;
pub use ranker::rank;
