use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::connpass::EventSource;
use super::reconciler::EventReconciler;
use super::store::CalendarStore;
use super::sync::run_sync_pass;
use crate::config::Config;
use crate::error::BotResult;
use crate::utils::scheduler::Scheduler;

/// Everything one sync pass needs
#[derive(Clone)]
pub struct SyncJob {
    pub source: Arc<dyn EventSource>,
    pub reconciler: EventReconciler,
    pub store: Arc<dyn CalendarStore>,
}

/// Runs a calendar sync pass at start-up and then on a fixed interval
pub struct CalendarSyncScheduler;

impl Scheduler for CalendarSyncScheduler {
    type Handle = SyncJob;

    fn start(
        config: Arc<RwLock<Config>>,
        handle: Self::Handle,
        shutdown: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = BotResult<()>> + Send>> {
        Box::pin(run_scheduler_loop(config, handle, shutdown))
    }
}

async fn run_scheduler_loop(
    config: Arc<RwLock<Config>>,
    job: SyncJob,
    shutdown: CancellationToken,
) -> BotResult<()> {
    let interval = config.read().await.sync_interval_secs.max(60);

    info!("Calendar sync scheduler started, syncing every {} seconds", interval);

    loop {
        if let Err(e) =
            run_sync_pass(job.source.as_ref(), &job.reconciler, job.store.as_ref(), Utc::now()).await
        {
            error!("Calendar sync pass failed: {}", e);
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep(TokioDuration::from_secs(interval)) => {}
        }
    }

    info!("Calendar sync scheduler stopped");
    Ok(())
}
