pub mod actor;
pub mod connpass;
pub mod handle;
pub mod models;
pub mod reconciler;
pub mod scheduler;
pub mod store;
pub mod sync;

pub use connpass::{ConnpassClient, EventSource};
pub use handle::GoogleCalendarHandle;
pub use models::{EntryHandle, EntryPayload, SkipReason, SourceEvent, SyncAction};
pub use reconciler::{EventReconciler, ReconcilerConfig};
pub use store::CalendarStore;
pub use sync::{run_sync_pass, SyncSummary};

use crate::config::Config;
use crate::error::{component_error, BotResult};
use crate::utils::scheduler::Scheduler;
use crate::utils::token::TokenManager;
use async_trait::async_trait;
use scheduler::{CalendarSyncScheduler, SyncJob};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Build the reconciler from configuration
pub fn build_reconciler(config: &Config) -> EventReconciler {
    EventReconciler::new(ReconcilerConfig::new(
        config.excluded_titles.clone(),
        config.timezone.clone(),
    ))
}

/// Build the sync job around an already running calendar handle
pub fn build_job(config: &Config, calendar: GoogleCalendarHandle) -> SyncJob {
    SyncJob {
        source: Arc::new(ConnpassClient::new(config)),
        reconciler: build_reconciler(config),
        store: Arc::new(calendar),
    }
}

/// Mirrors connpass events into the Google Calendar
#[derive(Default)]
pub struct CalendarSync {
    task: Mutex<Option<JoinHandle<()>>>,
    calendar: Mutex<Option<GoogleCalendarHandle>>,
}

impl CalendarSync {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl super::Component for CalendarSync {
    fn name(&self) -> &'static str {
        "calendar_sync"
    }

    async fn init(&self, config: Arc<RwLock<Config>>, shutdown: CancellationToken) -> BotResult<()> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(component_error("Calendar sync scheduler is already running"));
        }

        let job = {
            let config = config.read().await;
            let calendar = GoogleCalendarHandle::new(&config, TokenManager::new(&config));
            *self.calendar.lock().await = Some(calendar.clone());
            build_job(&config, calendar)
        };

        *task = Some(tokio::spawn(async move {
            if let Err(e) = CalendarSyncScheduler::start(config, job, shutdown).await {
                error!("Calendar sync scheduler exited with error: {}", e);
            }
        }));

        Ok(())
    }

    async fn shutdown(&self) -> BotResult<()> {
        if let Some(task) = self.task.lock().await.take() {
            task.await
                .map_err(|e| component_error(&format!("Calendar sync task panicked: {}", e)))?;
            info!("Calendar sync scheduler joined");
        }

        if let Some(calendar) = self.calendar.lock().await.take() {
            calendar.shutdown().await?;
        }

        Ok(())
    }
}
