//! Google Calendar store implementation.

pub mod client;
pub mod tokens;

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::browser::BoxFuture;
use crate::error::ProviderResult;
use crate::store::{CalendarEntry, CalendarStore, EventPage, EventPayload};

pub use client::GoogleCalendarClient;
pub use tokens::UserToken;

/// Settings for the Google Calendar connection.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Path to the authorized-user token file.
    pub token_path: PathBuf,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            token_path: PathBuf::from("token.json"),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// A [`CalendarStore`] backed by the Google Calendar API.
#[derive(Debug)]
pub struct GoogleCalendarStore {
    client: GoogleCalendarClient,
}

impl GoogleCalendarStore {
    /// Loads the token file, refreshing and re-saving it when the access
    /// token has expired, and opens the API client.
    pub async fn connect(config: &GoogleConfig) -> ProviderResult<Self> {
        let mut token = UserToken::load(&config.token_path)?;

        if token.is_expired() {
            info!("access token expired, refreshing");
            let http_client = reqwest::Client::new();
            token.refresh(&http_client).await?;
            token.save(&config.token_path)?;
        }

        let client = GoogleCalendarClient::new(&token.access_token, config.request_timeout)?;
        Ok(Self { client })
    }
}

impl CalendarStore for GoogleCalendarStore {
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarEntry>>> {
        Box::pin(self.client.list_calendars())
    }

    fn list_events(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<EventPage>> {
        let calendar_id = calendar_id.to_string();
        let page_token = page_token.map(String::from);
        Box::pin(async move {
            self.client
                .list_events(&calendar_id, page_token.as_deref())
                .await
        })
    }

    fn insert_event(
        &self,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> BoxFuture<'_, ProviderResult<String>> {
        let calendar_id = calendar_id.to_string();
        let payload = payload.clone();
        Box::pin(async move { self.client.insert_event(&calendar_id, &payload).await })
    }

    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let calendar_id = calendar_id.to_string();
        let event_id = event_id.to_string();
        Box::pin(async move { self.client.delete_event(&calendar_id, &event_id).await })
    }
}
