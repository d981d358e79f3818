pub mod codes;
pub mod error;
pub mod registry;
pub mod store;

pub use error::EngineError;
pub use error::Result;
pub use registry::AddUsageReport;
pub use registry::RegistryConfig;
pub use registry::SessionRegistry;
pub use registry::VoteUsageReport;
pub use store::MemoryStore;
pub use store::SessionStore;
