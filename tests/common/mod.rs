use std::sync::{Arc, Once};

use arena_rating::{
    clock::ManualClock,
    rate_limit::{ManualScheduler, RateLimitConfig, RateLimiter}
};
use chrono::{TimeZone, Utc};

static INIT: Once = Once::new();

pub const MODELS: [&str; 4] = ["gpt-4", "gpt-3.5-turbo", "gemini-pro", "llama-3"];

/// Installs a warn-level subscriber once per test binary
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
            .with_test_writer()
            .try_init();
    });
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()))
}

/// A limiter driven entirely by hand: time moves with `clock`, jobs run
/// when `scheduler` is ticked.
pub fn manual_limiter(config: RateLimitConfig) -> (Arc<RateLimiter>, Arc<ManualClock>, Arc<ManualScheduler>) {
    let clock = manual_clock();
    let scheduler = Arc::new(ManualScheduler::new());
    let limiter = Arc::new(RateLimiter::new(config, clock.clone(), scheduler.clone()));

    (limiter, clock, scheduler)
}
