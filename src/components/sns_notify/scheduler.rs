use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::matcher::ScheduleMatcher;
use super::notifications::run_notify_pass;
use super::senders::ChannelSenders;
use super::sheets::ScheduleSource;
use crate::config::Config;
use crate::error::BotResult;
use crate::utils::scheduler::Scheduler;
use crate::utils::time::{calculate_wait_duration, next_tick};

/// Everything one notify pass needs
#[derive(Clone)]
pub struct NotifyJob {
    pub source: Arc<dyn ScheduleSource>,
    pub matcher: ScheduleMatcher,
    pub senders: ChannelSenders,
}

/// Runs a notify pass on every wall-clock tick of the matcher interval
pub struct SnsNotifyScheduler;

impl Scheduler for SnsNotifyScheduler {
    type Handle = NotifyJob;

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
    job: NotifyJob,
    shutdown: CancellationToken,
) -> BotResult<()> {
    let tz = config.read().await.tz()?;
    let interval = job.matcher.config().interval_minutes;

    info!("SNS notify scheduler started, ticking every {} minutes", interval);

    loop {
        let now = Utc::now().with_timezone(&tz).naive_local();
        let Some(tick) = next_tick(&now, interval) else {
            error!("Failed to calculate next notify tick after {}", now);
            sleep(TokioDuration::from_secs(60)).await;
            continue;
        };

        let wait_seconds = calculate_wait_duration(&now, &tick);
        info!("Next notify pass scheduled for {}", tick);

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep(TokioDuration::from_secs(wait_seconds)) => {}
        }

        // Evaluate at the tick itself so wakeup jitter cannot skip a window
        if let Err(e) =
            run_notify_pass(job.source.as_ref(), &job.matcher, &job.senders, tick).await
        {
            error!("Notify pass failed: {}", e);
        }
    }

    info!("SNS notify scheduler stopped");
    Ok(())
}
