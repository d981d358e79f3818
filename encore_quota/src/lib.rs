pub mod error;
pub mod policy;
pub mod time;
pub mod tracker;
mod window;

pub use error::QuotaError;
pub use error::Result;
pub use policy::KindPolicy;
pub use policy::QuotaPolicy;
pub use time::Clock;
pub use time::ManualClock;
pub use time::SystemClock;
pub use tracker::QuotaTracker;
pub use tracker::QuotaUsage;
