//! Per-token cool-down and global request quota for generation requests.

pub mod config;
pub mod error;
pub mod limiter;
pub mod scheduler;

pub use config::{ConfigError, RateLimitConfig};
pub use error::RateLimitError;
pub use limiter::RateLimiter;
pub use scheduler::{JobHandle, ManualScheduler, Scheduler, TokioScheduler};
