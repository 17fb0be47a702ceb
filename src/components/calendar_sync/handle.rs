use super::actor::{GoogleCalendarActor, GoogleCalendarActorHandle};
use super::models::{EntryHandle, EntryPayload};
use super::store::CalendarStore;
use crate::config::Config;
use crate::error::BotResult;
use crate::utils::token::TokenManager;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Handle for interacting with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarHandle {
    actor_handle: GoogleCalendarActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl GoogleCalendarHandle {
    /// Create a new GoogleCalendarHandle and spawn the actor
    pub fn new(config: &Config, token_manager: TokenManager) -> Self {
        // Create the actor and get its handle
        let (mut actor, handle) = GoogleCalendarActor::new(config, token_manager);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl CalendarStore for GoogleCalendarHandle {
    async fn find(&self, query: &str) -> BotResult<Option<EntryHandle>> {
        self.actor_handle.find(query).await
    }

    async fn insert(&self, payload: &EntryPayload) -> BotResult<EntryHandle> {
        self.actor_handle.insert(payload).await
    }

    async fn update(&self, handle: &EntryHandle, payload: &EntryPayload) -> BotResult<()> {
        self.actor_handle.update(handle, payload).await
    }
}
