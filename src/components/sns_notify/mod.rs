pub mod matcher;
pub mod models;
pub mod notifications;
pub mod scheduler;
pub mod senders;
pub mod sheets;

pub use matcher::{MatcherConfig, ScheduleMatcher};
pub use models::{Channel, NotifyDecision, Recurrence, ScheduleRow, ValidityWindow};

use crate::config::Config;
use crate::error::{component_error, BotResult};
use crate::utils::scheduler::Scheduler;
use crate::utils::token::TokenManager;
use async_trait::async_trait;
use scheduler::{NotifyJob, SnsNotifyScheduler};
use senders::ChannelSenders;
use sheets::SheetsClient;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Build the notify job from configuration
pub fn build_job(config: &Config) -> NotifyJob {
    let token_manager = TokenManager::new(config);
    NotifyJob {
        source: Arc::new(SheetsClient::new(config, token_manager)),
        matcher: ScheduleMatcher::new(MatcherConfig::for_locale(
            config.notify_interval_minutes,
            &config.weekday_locale,
        )),
        senders: ChannelSenders::from_config(config),
    }
}

/// Posts spreadsheet-scheduled messages to Twitter and Facebook
#[derive(Default)]
pub struct SnsNotify {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SnsNotify {
    pub fn new() -> Self {
        Self {
            task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl super::Component for SnsNotify {
    fn name(&self) -> &'static str {
        "sns_notify"
    }

    async fn init(&self, config: Arc<RwLock<Config>>, shutdown: CancellationToken) -> BotResult<()> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(component_error("SNS notify scheduler is already running"));
        }

        let job = build_job(&*config.read().await);

        *task = Some(tokio::spawn(async move {
            if let Err(e) = SnsNotifyScheduler::start(config, job, shutdown).await {
                error!("SNS notify scheduler exited with error: {}", e);
            }
        }));

        Ok(())
    }

    async fn shutdown(&self) -> BotResult<()> {
        // The scheduler observes the cancelled token and returns on its own
        if let Some(task) = self.task.lock().await.take() {
            task.await
                .map_err(|e| component_error(&format!("SNS notify task panicked: {}", e)))?;
            info!("SNS notify scheduler joined");
        }
        Ok(())
    }
}
