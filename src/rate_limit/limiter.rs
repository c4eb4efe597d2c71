use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration
};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    clock::Clock,
    rate_limit::{
        config::RateLimitConfig,
        error::RateLimitError,
        scheduler::{Job, JobHandle, JobResult, Scheduler}
    }
};

pub const SWEEP_JOB: &str = "rate-limit-token-sweep";
pub const RESET_JOB: &str = "rate-limit-counter-reset";

#[derive(Debug, Default)]
struct LimiterState {
    // Token -> time of its last accepted request
    last_request_times: HashMap<String, DateTime<Utc>>,
    // Accepted requests in the current reset period, always <= limit
    request_count: u64
}

struct Inner {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<LimiterState>
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, LimiterState> {
        // Every critical section leaves the state consistent, so a poisoned
        // lock is still safe to use
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn elapsed_since(&self, instant: DateTime<Utc>) -> Duration {
        // A clock that stepped backwards counts as no time elapsed
        self.clock
            .now()
            .signed_duration_since(instant)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    fn sweep(&self) -> usize {
        let mut state = self.state();
        let before = state.last_request_times.len();

        let now = self.clock.now();
        let max_age = self.config.token_max_age;
        state.last_request_times.retain(|_, last_request| {
            now.signed_duration_since(*last_request)
                .to_std()
                .map_or(true, |age| age < max_age)
        });

        let removed = before - state.last_request_times.len();
        info!(
            "Swept {} stale tokens, {} remain",
            removed,
            state.last_request_times.len()
        );

        removed
    }

    fn reset(&self) {
        let mut state = self.state();
        info!("Resetting request count (was {})", state.request_count);
        state.request_count = 0;
    }
}

/// Per-token cool-down plus a global request quota.
///
/// Tokens must be admitted with [`RateLimiter::initialize_request`] before
/// their first check. Each accepted request stamps the token and consumes one
/// unit of the global quota. Two background jobs, registered on
/// [`RateLimiter::start`], drop tokens idle for longer than
/// `token_max_age` and return the quota to zero every `reset_period`.
pub struct RateLimiter {
    inner: Arc<Inner>,
    scheduler: Arc<dyn Scheduler>,
    jobs: Mutex<Vec<JobHandle>>
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>, scheduler: Arc<dyn Scheduler>) -> RateLimiter {
        RateLimiter {
            inner: Arc::new(Inner {
                config,
                clock,
                state: Mutex::new(LimiterState::default())
            }),
            scheduler,
            jobs: Mutex::new(Vec::new())
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.inner.config
    }

    /// Admits `token`. Its first check always passes the cool-down.
    /// Calling this again re-admits the token and clears its cool-down.
    pub fn initialize_request(&self, token: &str) {
        self.inner
            .state()
            .last_request_times
            .insert(token.to_string(), DateTime::<Utc>::MIN_UTC);
    }

    /// Creates a fresh session token and admits it.
    pub fn issue_token(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.initialize_request(&token);

        token
    }

    /// Accepts or rejects one request for `token`.
    ///
    /// Checks run in order: unknown token, cool-down, global quota. Only an
    /// accepted request changes state.
    pub fn check_rate_limit(&self, token: &str) -> Result<(), RateLimitError> {
        let mut state = self.inner.state();

        let last_request = match state.last_request_times.get(token) {
            Some(last_request) if !token.is_empty() => *last_request,
            _ => {
                debug!("Rejected request with unknown token");
                return Err(RateLimitError::InvalidToken);
            }
        };

        if self.inner.elapsed_since(last_request) < self.inner.config.cooldown {
            debug!("Rejected request from cooling down token {}", token);
            return Err(RateLimitError::UserRateLimited);
        }

        if state.request_count >= self.inner.config.limit {
            debug!("Rejected request, quota of {} exhausted", self.inner.config.limit);
            return Err(RateLimitError::SystemRateLimited);
        }

        state
            .last_request_times
            .insert(token.to_string(), self.inner.clock.now());
        state.request_count += 1;

        Ok(())
    }

    /// Removes tokens whose last request is at least `token_max_age` old.
    /// Returns the number removed.
    pub fn sweep_stale_tokens(&self) -> usize {
        self.inner.sweep()
    }

    pub fn reset_request_count(&self) {
        self.inner.reset()
    }

    pub fn request_count(&self) -> u64 {
        self.inner.state().request_count
    }

    pub fn is_active(&self, token: &str) -> bool {
        self.inner.state().last_request_times.contains_key(token)
    }

    pub fn active_tokens(&self) -> usize {
        self.inner.state().last_request_times.len()
    }

    /// Registers the sweep and reset jobs. Does nothing if already started.
    pub fn start(&self) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if !jobs.is_empty() {
            return;
        }

        let sweeper = self.inner.clone();
        let sweep: Job = Arc::new(move || -> JobResult {
            sweeper.sweep();
            Ok(())
        });

        let resetter = self.inner.clone();
        let reset: Job = Arc::new(move || -> JobResult {
            resetter.reset();
            Ok(())
        });

        jobs.push(
            self.scheduler
                .schedule(SWEEP_JOB, self.inner.config.sweep_period, sweep)
        );
        jobs.push(
            self.scheduler
                .schedule(RESET_JOB, self.inner.config.reset_period, reset)
        );

        info!(
            "Rate limiter started (limit {}, cooldown {:?})",
            self.inner.config.limit, self.inner.config.cooldown
        );
    }

    /// Cancels the background jobs. Limiter state is kept.
    pub fn stop(&self) {
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.is_empty() {
            return;
        }

        for job in jobs.iter_mut() {
            job.cancel();
        }
        jobs.clear();

        info!("Rate limiter stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.jobs.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.stop();
    }
}
