use std::{
    error::Error,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError
    },
    time::Duration
};

use tokio::{
    runtime::{Handle, TryCurrentError},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior}
};
use tracing::{debug, error};

const MIN_PERIOD: Duration = Duration::from_millis(1);
// About 30 years, the horizon tokio itself uses for a far-future deadline
const MAX_PERIOD: Duration = Duration::from_secs(86_400 * 365 * 30);

pub type JobResult = Result<(), Box<dyn Error + Send + Sync>>;
pub type Job = Arc<dyn Fn() -> JobResult + Send + Sync>;

/// Runs jobs on a fixed period until their handle is cancelled.
pub trait Scheduler: Send + Sync {
    /// Schedules `job` to run every `period`, first after one full period.
    fn schedule(&self, name: &'static str, period: Duration, job: Job) -> JobHandle;
}

/// Cancels a scheduled job. Dropping the handle leaves the job running.
#[derive(Debug)]
pub struct JobHandle {
    name: &'static str,
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>
}

impl JobHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);

        if let Some(task) = self.task.take() {
            task.abort();
        }

        debug!("Cancelled scheduled job '{}'", self.name);
    }
}

/// Runs one tick of a job. Failures and panics are logged and swallowed so
/// the job keeps its schedule. Returns whether the tick succeeded.
pub fn run_job(name: &str, job: &Job) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(|| job())) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("Scheduled job '{}' failed: {}", name, e);
            false
        }
        Err(_) => {
            error!("Scheduled job '{}' panicked", name);
            false
        }
    }
}

/// Spawns one task per job on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> TokioScheduler {
        TokioScheduler { handle }
    }

    /// Uses the runtime the caller is running on.
    pub fn current() -> Result<TokioScheduler, TryCurrentError> {
        Ok(TokioScheduler::new(Handle::try_current()?))
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, name: &'static str, period: Duration, job: Job) -> JobHandle {
        let period = period.clamp(MIN_PERIOD, MAX_PERIOD);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let task = self.handle.spawn(async move {
            let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
            let mut ticker = time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if flag.load(Ordering::SeqCst) {
                    break;
                }

                run_job(name, &job);
            }
        });

        debug!("Scheduled job '{}' every {:?}", name, period);

        JobHandle {
            name,
            cancelled,
            task: Some(task)
        }
    }
}

struct ManualJob {
    name: &'static str,
    period: Duration,
    job: Job,
    cancelled: Arc<AtomicBool>
}

/// A scheduler whose jobs only run when ticked by hand.
#[derive(Default)]
pub struct ManualScheduler {
    jobs: Mutex<Vec<ManualJob>>
}

impl ManualScheduler {
    pub fn new() -> ManualScheduler {
        ManualScheduler::default()
    }

    /// Runs every live job named `name` once. Returns how many ran.
    pub fn run(&self, name: &str) -> usize {
        let jobs: Vec<(&'static str, Job)> = self
            .live_jobs()
            .into_iter()
            .filter(|(job_name, _, _)| *job_name == name)
            .map(|(job_name, _, job)| (job_name, job))
            .collect();

        for (job_name, job) in &jobs {
            run_job(job_name, job);
        }

        jobs.len()
    }

    /// Names and periods of the jobs that have not been cancelled.
    pub fn scheduled(&self) -> Vec<(&'static str, Duration)> {
        self.live_jobs()
            .into_iter()
            .map(|(name, period, _)| (name, period))
            .collect()
    }

    fn live_jobs(&self) -> Vec<(&'static str, Duration, Job)> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|job| !job.cancelled.load(Ordering::SeqCst))
            .map(|job| (job.name, job.period, job.job.clone()))
            .collect()
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, name: &'static str, period: Duration, job: Job) -> JobHandle {
        let cancelled = Arc::new(AtomicBool::new(false));

        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ManualJob {
                name,
                period,
                job,
                cancelled: cancelled.clone()
            });

        JobHandle {
            name,
            cancelled,
            task: None
        }
    }
}
