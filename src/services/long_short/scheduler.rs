use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::collector::DataCollectionService;
use super::schedule::JobSchedule;
use crate::db::postgres::repository::api_log_repository::TraitApiLogRepository;
use crate::db::postgres::repository::long_short_ratio_repository::TraitLongShortRatioRepository;
use crate::services::exchanges::models::{Exchange, Reading, UnknownExchange};

/// Minutes between scheduled collection runs.
pub const COLLECTION_INTERVAL_MINUTES: u32 = 15;

/// Readings older than this are removed by the nightly retention job.
pub const READING_RETENTION_DAYS: i64 = 7;

/// Local wall-clock hour of the retention job.
const RETENTION_HOUR: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,
    #[error("scheduler is not running")]
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub collected: usize,
    pub saved: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionSummary {
    pub readings_deleted: u64,
    pub request_logs_deleted: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NextRun {
    pub job: &'static str,
    pub schedule: String,
    pub next_run: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub tasks_count: usize,
    pub next_runs: Vec<NextRun>,
    pub symbols: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy)]
enum Job {
    Collection,
    Retention,
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::Collection => "collection",
            Job::Retention => "retention",
        }
    }

    fn schedule(&self) -> JobSchedule {
        match self {
            Job::Collection => JobSchedule::Every {
                minutes: COLLECTION_INTERVAL_MINUTES,
            },
            Job::Retention => {
                JobSchedule::DailyAt(NaiveTime::from_hms_opt(RETENTION_HOUR, 0, 0).unwrap_or(NaiveTime::MIN))
            }
        }
    }
}

struct ScheduledJob {
    job: Job,
    next_run: Arc<Mutex<Option<DateTime<Local>>>>,
    _task: JoinHandle<()>,
}

enum SchedulerState {
    Stopped,
    Running {
        shutdown: watch::Sender<bool>,
        jobs: Vec<ScheduledJob>,
    },
}

/// Drives periodic collection and retention on background tasks.
pub struct DataScheduler {
    collector: Arc<DataCollectionService>,
    ratios: Arc<dyn TraitLongShortRatioRepository + Send + Sync>,
    request_log: Arc<dyn TraitApiLogRepository + Send + Sync>,
    request_log_retention_days: Option<u32>,
    state: Mutex<SchedulerState>,
    last_updated: Mutex<Option<DateTime<Utc>>>,
}

impl DataScheduler {
    pub fn new(
        collector: Arc<DataCollectionService>,
        ratios: Arc<dyn TraitLongShortRatioRepository + Send + Sync>,
        request_log: Arc<dyn TraitApiLogRepository + Send + Sync>,
        request_log_retention_days: Option<u32>,
    ) -> Self {
        Self {
            collector,
            ratios,
            request_log,
            request_log_retention_days,
            state: Mutex::new(SchedulerState::Stopped),
            last_updated: Mutex::new(None),
        }
    }

    /// Registers both recurring jobs and kicks off one collection run
    /// without waiting for it.
    pub fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        let mut state = self.lock_state();
        if matches!(*state, SchedulerState::Running { .. }) {
            return Err(SchedulerError::AlreadyRunning);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let jobs = [Job::Collection, Job::Retention]
            .into_iter()
            .map(|job| self.spawn_job(job, shutdown_rx.clone()))
            .collect();

        *state = SchedulerState::Running { shutdown, jobs };
        drop(state);

        info!(
            "Scheduler started: collection every {} min for {:?}, retention daily at {:02}:00",
            COLLECTION_INTERVAL_MINUTES,
            self.collector.symbols(),
            RETENTION_HOUR
        );

        let scheduler = self.clone();
        tokio::spawn(async move {
            info!("Scheduler: running initial collection");
            scheduler.collect_now().await;
        });

        Ok(())
    }

    /// Cancels future firings. A run already in progress completes.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let mut state = self.lock_state();
        match std::mem::replace(&mut *state, SchedulerState::Stopped) {
            SchedulerState::Running { shutdown, .. } => {
                let _ = shutdown.send(true);
                info!("Scheduler stopped");
                Ok(())
            }
            SchedulerState::Stopped => Err(SchedulerError::NotRunning),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock_state(), SchedulerState::Running { .. })
    }

    /// Runs one collection pass on the caller's task and stores every
    /// reading. Failed upserts are logged and left out of `saved`.
    pub async fn collect_now(&self) -> CollectionSummary {
        let readings = self.collector.collect_all().await;
        self.store(readings).await
    }

    /// Same as `collect_now`, limited to one configured exchange.
    pub async fn collect_exchange_now(&self, exchange: Exchange) -> Result<CollectionSummary, UnknownExchange> {
        let readings = self.collector.collect_exchange(exchange).await?;
        Ok(self.store(readings).await)
    }

    async fn store(&self, readings: Vec<Reading>) -> CollectionSummary {
        let mut saved = 0;
        for reading in &readings {
            match self.ratios.upsert(reading).await {
                Ok(()) => saved += 1,
                Err(e) => error!(
                    "Failed to save {} {} reading at {}: {}",
                    reading.exchange, reading.symbol, reading.observed_at, e
                ),
            }
        }

        let summary = CollectionSummary {
            collected: readings.len(),
            saved,
        };

        if summary.collected == 0 {
            warn!("Collection finished without readings");
        } else {
            info!(
                "Collection finished: collected {}, saved {}",
                summary.collected, summary.saved
            );
        }

        *self.last_updated.lock().unwrap_or_else(|e| e.into_inner()) = Some(Utc::now());

        summary
    }

    /// Deletes readings older than the retention window measured from
    /// `now`, plus request logs when their retention is configured.
    pub async fn run_retention(&self, now: DateTime<Utc>) -> RetentionSummary {
        let mut summary = RetentionSummary::default();

        let cutoff = now - Duration::days(READING_RETENTION_DAYS);
        match self.ratios.delete_before(cutoff).await {
            Ok(deleted) => {
                summary.readings_deleted = deleted;
                info!("Retention: deleted {} readings observed before {}", deleted, cutoff);
            }
            Err(e) => error!("Retention: failed to delete readings before {}: {}", cutoff, e),
        }

        if let Some(days) = self.request_log_retention_days {
            let cutoff = now - Duration::days(days.into());
            match self.request_log.delete_before(cutoff).await {
                Ok(deleted) => {
                    summary.request_logs_deleted = deleted;
                    info!("Retention: deleted {} request logs created before {}", deleted, cutoff);
                }
                Err(e) => error!("Retention: failed to delete request logs before {}: {}", cutoff, e),
            }
        }

        summary
    }

    pub fn status(&self) -> SchedulerStatus {
        let state = self.lock_state();

        let (running, next_runs) = match &*state {
            SchedulerState::Stopped => (false, Vec::new()),
            SchedulerState::Running { jobs, .. } => (
                true,
                jobs.iter()
                    .map(|job| NextRun {
                        job: job.job.name(),
                        schedule: job.job.schedule().to_string(),
                        next_run: *job.next_run.lock().unwrap_or_else(|e| e.into_inner()),
                    })
                    .collect(),
            ),
        };

        SchedulerStatus {
            running,
            tasks_count: next_runs.len(),
            next_runs,
            symbols: self.collector.symbols().to_vec(),
            last_updated: *self.last_updated.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }

    fn spawn_job(self: &Arc<Self>, job: Job, mut shutdown: watch::Receiver<bool>) -> ScheduledJob {
        let schedule = job.schedule();
        let next_run = Arc::new(Mutex::new(Some(schedule.next_after(&Local::now()))));

        let scheduler = self.clone();
        let shared_next_run = next_run.clone();
        let task = tokio::spawn(async move {
            loop {
                let now = Local::now();
                let next = schedule.next_after(&now);
                *shared_next_run.lock().unwrap_or_else(|e| e.into_inner()) = Some(next);
                debug!("Scheduler: next {} run at {}", job.name(), next);

                let wait = (next - now).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = shutdown.changed() => break,
                }

                info!("Scheduler: triggering {} job", job.name());
                match job {
                    Job::Collection => {
                        scheduler.collect_now().await;
                    }
                    Job::Retention => {
                        scheduler.run_retention(Utc::now()).await;
                    }
                }
            }

            debug!("Scheduler: {} job exited", job.name());
        });

        ScheduledJob {
            job,
            next_run,
            _task: task,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
