use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::{Config, SchedulerConfig};
use crate::db::Store;
use crate::services::DailyQuizGenerator;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub generator: DailyQuizGenerator,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let generator = DailyQuizGenerator::new(store.clone(), config.quiz.clone());

        Ok(Self {
            config,
            store,
            generator,
        })
    }
}

pub struct Scheduler {
    state: Arc<RwLock<AppState>>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(state: Arc<RwLock<AppState>>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting daily quiz scheduler");

        if let Some(cron_expr) = &self.config.cron_expression {
            self.run_with_cron(cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let state = Arc::clone(&self.state);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                if let Err(e) = generate_daily_quiz(state).await {
                    error!("Scheduled quiz generation failed: {}", e);
                }
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        let interval_mins = self.config.interval_minutes;

        info!("Scheduler running every {} minutes", interval_mins);

        let mut check_interval = interval(Duration::from_secs(u64::from(interval_mins) * 60));

        loop {
            check_interval.tick().await;

            if !*self.running.read().await {
                break;
            }

            // Idempotent per date: once today's quiz exists this only
            // re-reads the stored row.
            if let Err(e) = generate_daily_quiz(Arc::clone(&self.state)).await {
                error!("Scheduled quiz generation failed: {}", e);
            }
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    pub async fn run_once(&self) -> Result<()> {
        info!("Running manual quiz generation...");
        generate_daily_quiz(Arc::clone(&self.state)).await
    }
}

async fn generate_daily_quiz(state: Arc<RwLock<AppState>>) -> Result<()> {
    let state = state.read().await.clone();

    let selection = state.generator.generate().await?;

    if selection.is_empty() {
        info!("Daily quiz check complete: nothing generated");
    } else {
        info!("Daily quiz ready with {} questions", selection.len());
    }

    Ok(())
}
