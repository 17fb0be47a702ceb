use super::models::{CalendarEntry, EntryHandle, EntryPayload};
use super::store::find_entry_by_url;
use crate::config::Config;
use crate::error::{google_calendar_error, BotResult};
use crate::utils::token::TokenManager;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use url::Url;

/// The Google Calendar actor that processes messages
pub struct GoogleCalendarActor {
    calendar_id: String,
    token_manager: TokenManager,
    client: Client,
    command_rx: mpsc::Receiver<GoogleCalendarCommand>,
}

/// Commands that can be sent to the Google Calendar actor
pub enum GoogleCalendarCommand {
    Find(String, mpsc::Sender<BotResult<Option<EntryHandle>>>),
    Insert(EntryPayload, mpsc::Sender<BotResult<EntryHandle>>),
    Update(EntryHandle, EntryPayload, mpsc::Sender<BotResult<()>>),
    Shutdown,
}

/// Handle for communicating with the Google Calendar actor
#[derive(Clone)]
pub struct GoogleCalendarActorHandle {
    command_tx: mpsc::Sender<GoogleCalendarCommand>,
}

impl GoogleCalendarActorHandle {
    async fn request<T>(
        &self,
        command: GoogleCalendarCommand,
        mut response_rx: mpsc::Receiver<BotResult<T>>,
    ) -> BotResult<T> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| google_calendar_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| google_calendar_error("Response channel closed"))?
    }

    /// Find the entry whose description contains `query`
    pub async fn find(&self, query: &str) -> BotResult<Option<EntryHandle>> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(
            GoogleCalendarCommand::Find(query.to_string(), response_tx),
            response_rx,
        )
        .await
    }

    /// Create a new entry
    pub async fn insert(&self, payload: &EntryPayload) -> BotResult<EntryHandle> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(
            GoogleCalendarCommand::Insert(payload.clone(), response_tx),
            response_rx,
        )
        .await
    }

    /// Replace an existing entry
    pub async fn update(&self, handle: &EntryHandle, payload: &EntryPayload) -> BotResult<()> {
        let (response_tx, response_rx) = mpsc::channel(1);
        self.request(
            GoogleCalendarCommand::Update(handle.clone(), payload.clone(), response_tx),
            response_rx,
        )
        .await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> BotResult<()> {
        let _ = self.command_tx.send(GoogleCalendarCommand::Shutdown).await;
        Ok(())
    }
}

/// `events.list` response
#[derive(Debug, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<CalendarEntry>,
}

impl GoogleCalendarActor {
    /// Create a new actor and return its handle
    pub fn new(config: &Config, token_manager: TokenManager) -> (Self, GoogleCalendarActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            calendar_id: config.google_calendar_id.clone(),
            token_manager,
            client: Client::new(),
            command_rx,
        };

        let handle = GoogleCalendarActorHandle { command_tx };

        (actor, handle)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Google Calendar actor started");

        // Process commands one at a time
        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                GoogleCalendarCommand::Find(query, response_tx) => {
                    let result = self.find_entry(&query).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Insert(payload, response_tx) => {
                    let result = self.insert_entry(&payload).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Update(handle, payload, response_tx) => {
                    let result = self.update_entry(&handle, &payload).await;
                    let _ = response_tx.send(result).await;
                }
                GoogleCalendarCommand::Shutdown => {
                    info!("Google Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Google Calendar actor shut down");
    }

    /// `calendars/{id}/events[/{event_id}]`
    fn events_url(&self, event_id: Option<&EntryHandle>) -> BotResult<Url> {
        let mut url = Url::parse("https://www.googleapis.com/calendar/v3/calendars/")
            .map_err(|e| google_calendar_error(&format!("Failed to parse URL: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| google_calendar_error("Calendar URL cannot be a base"))?;
            segments.pop_if_empty().push(&self.calendar_id).push("events");
            if let Some(event_id) = event_id {
                segments.push(&event_id.0);
            }
        }
        Ok(url)
    }

    /// Send an authorized request and decode the JSON body
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, action: &str) -> BotResult<T> {
        let access_token = self.token_manager.get_access_token().await?;

        let response = request
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(google_calendar_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse {} response: {}", action, e)))
    }

    async fn find_entry(&self, query: &str) -> BotResult<Option<EntryHandle>> {
        let mut url = self.events_url(None)?;
        url.query_pairs_mut().append_pair("q", query);

        let list: EventList = self.send(self.client.get(url), "search events").await?;
        debug!("Search for {} returned {} entries", query, list.items.len());

        Ok(find_entry_by_url(&list.items, query).map(|entry| entry.external_id.clone()))
    }

    async fn insert_entry(&self, payload: &EntryPayload) -> BotResult<EntryHandle> {
        let url = self.events_url(None)?;
        let entry: CalendarEntry = self
            .send(self.client.post(url).json(payload), "insert event")
            .await?;
        Ok(entry.external_id)
    }

    async fn update_entry(&self, handle: &EntryHandle, payload: &EntryPayload) -> BotResult<()> {
        let url = self.events_url(Some(handle))?;
        let _: CalendarEntry = self
            .send(self.client.put(url).json(payload), "update event")
            .await?;
        Ok(())
    }
}
