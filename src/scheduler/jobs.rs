use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};

use crate::errors::{BotError, BotResult};
use crate::logger::{self, LogTag};

/// How often the scheduler loop wakes to look for due jobs
const TICK_INTERVAL_SECS: u64 = 20;

/// Async job body
pub type JobCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// When a job fires (times are wall clock in the scheduler's timezone)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobSchedule {
    /// Monday through Friday at the given time
    Weekdays(NaiveTime),
    /// Every day at the given time
    Daily(NaiveTime),
    /// Once a week on the given day
    Weekly(Weekday, NaiveTime),
}

impl JobSchedule {
    fn matches(&self, now: DateTime<Tz>) -> bool {
        let (time, day_ok) = match self {
            JobSchedule::Weekdays(t) => {
                (*t, !matches!(now.weekday(), Weekday::Sat | Weekday::Sun))
            }
            JobSchedule::Daily(t) => (*t, true),
            JobSchedule::Weekly(day, t) => (*t, now.weekday() == *day),
        };
        day_ok && now.hour() == time.hour() && now.minute() == time.minute()
    }
}

struct Job {
    schedule: JobSchedule,
    callback: JobCallback,
    /// Guard against overlapping runs of the same job
    running: Arc<AtomicBool>,
    /// Minute key of the last fired instant, e.g. "2026-01-12 09:30"
    last_fired: Mutex<Option<String>>,
}

/// Registry plus tick loop dispatching due jobs
pub struct JobScheduler {
    tz: Tz,
    jobs: Arc<RwLock<HashMap<String, Arc<Job>>>>,
    shutdown: Arc<Notify>,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl JobScheduler {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            jobs: Arc::new(RwLock::new(HashMap::new())),
            shutdown: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    /// Register a job under a unique id
    pub async fn add_job(
        &self,
        id: &str,
        schedule: JobSchedule,
        callback: JobCallback,
    ) -> BotResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(id) {
            return Err(BotError::Scheduler(format!("duplicate job id '{}'", id)));
        }
        jobs.insert(
            id.to_string(),
            Arc::new(Job {
                schedule,
                callback,
                running: Arc::new(AtomicBool::new(false)),
                last_fired: Mutex::new(None),
            }),
        );
        logger::debug(LogTag::Scheduler, &format!("Registered job '{}'", id));
        Ok(())
    }

    pub async fn remove_job(&self, id: &str) -> bool {
        let removed = self.jobs.write().await.remove(id).is_some();
        if removed {
            logger::debug(LogTag::Scheduler, &format!("Removed job '{}'", id));
        }
        removed
    }

    pub async fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Dispatch every job due at `now`; returns the ids dispatched
    ///
    /// A job fires at most once per scheduled minute. A job whose previous
    /// run has not finished is skipped for this instant.
    pub async fn run_due_jobs(&self, now: DateTime<Tz>) -> Vec<String> {
        let minute_key = now.format("%Y-%m-%d %H:%M").to_string();
        let jobs = self.jobs.read().await;
        let mut dispatched = Vec::new();

        for (id, job) in jobs.iter() {
            if !job.schedule.matches(now) {
                continue;
            }

            let mut last = job.last_fired.lock().await;
            if last.as_deref() == Some(minute_key.as_str()) {
                continue;
            }

            if job.running.load(Ordering::SeqCst) {
                logger::warning(
                    LogTag::Scheduler,
                    &format!("Job '{}' still running, skipping {}", id, minute_key),
                );
                *last = Some(minute_key.clone());
                continue;
            }

            *last = Some(minute_key.clone());
            job.running.store(true, Ordering::SeqCst);
            logger::info(LogTag::Scheduler, &format!("⏰ Firing job '{}'", id));

            let running = job.running.clone();
            let future = (job.callback)();
            tokio::spawn(async move {
                future.await;
                running.store(false, Ordering::SeqCst);
            });
            dispatched.push(id.clone());
        }

        dispatched
    }

    /// Start the background tick loop
    pub async fn start(self: &Arc<Self>) {
        let scheduler = self.clone();
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            logger::info(LogTag::Scheduler, "⏱️ Scheduler loop started");
            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        logger::info(LogTag::Scheduler, "Scheduler loop stopping");
                        break;
                    }
                    _ = tokio::time::sleep(std::time::Duration::from_secs(TICK_INTERVAL_SECS)) => {
                        let now = Utc::now().with_timezone(&scheduler.tz);
                        scheduler.run_due_jobs(now).await;
                    }
                }
            }
        });
        *self.handle.lock().await = Some(handle);
    }

    /// Signal the loop to stop and wait for it to exit
    pub async fn stop(&self) {
        self.shutdown.notify_waiters();
        if let Some(handle) = self.handle.lock().await.take() {
            let _ = tokio::time::timeout(std::time::Duration::from_secs(5), handle).await;
        }
    }
}
