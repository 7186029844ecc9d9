//! Google Calendar API client.
//!
//! A low-level HTTP client over the Calendar API v3 endpoints the
//! synchronizer needs: calendar listing, paged event listing, insertion,
//! and deletion.

use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::store::{CalendarEntry, EventPage, EventPayload, EventStart, StoredEvent};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl GoogleCalendarClient {
    /// Creates a client with the given access token.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
        })
    }

    /// Lists the calendars visible to the account.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarEntry>> {
        let url = format!("{}/users/me/calendarList", CALENDAR_API_BASE);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(map_request_error)?;

        let body = check_status(response).await?;
        let list: CalendarListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("failed to parse calendar list").with_source(e)
        })?;

        debug!(count = list.items.len(), "calendars listed");
        Ok(list.items)
    }

    /// Fetches one page of events from a calendar.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
    ) -> ProviderResult<EventPage> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );

        let mut request = self.http_client.get(&url).bearer_auth(&self.access_token);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(map_request_error)?;
        let body = check_status(response).await?;
        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("failed to parse event list").with_source(e)
        })?;

        let events = list.items.into_iter().map(convert_event).collect();
        Ok(EventPage {
            events,
            next_page_token: list.next_page_token,
        })
    }

    /// Inserts an event, returning its assigned id.
    pub async fn insert_event(
        &self,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> ProviderResult<String> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await
            .map_err(map_request_error)?;

        let body = check_status(response).await?;
        let inserted: InsertedEvent = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("failed to parse insert response").with_source(e)
        })?;

        debug!(event_id = %inserted.id, "event inserted");
        Ok(inserted.id)
    }

    /// Deletes an event by id. An already-gone event is not an error.
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> ProviderResult<()> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id),
            urlencoding::encode(event_id)
        );

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::GONE || status == reqwest::StatusCode::NOT_FOUND {
            debug!(event_id, "event already gone");
            return Ok(());
        }

        check_status(response).await?;
        Ok(())
    }
}

/// Maps a reqwest failure onto the request taxonomy.
fn map_request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network("request timeout").with_source(e)
    } else if e.is_connect() {
        ProviderError::network("connection failed").with_source(e)
    } else {
        ProviderError::network("request failed").with_source(e)
    }
}

/// Classifies non-success statuses and returns the body on success.
async fn check_status(response: reqwest::Response) -> ProviderResult<String> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ProviderError::authentication(
            "access token expired or invalid",
        ));
    }
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(ProviderError::authentication("access denied to calendar"));
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::rate_limited("rate limit exceeded"));
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::not_found("resource not found"));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::server(format!(
            "API error ({}): {}",
            status, body
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ProviderError::network("failed to read response").with_source(e))
}

/// Converts an API event into the store shape, keeping malformed starts
/// as `None` so the purge pass can skip them.
fn convert_event(event: ApiEvent) -> StoredEvent {
    let start = event.start.and_then(|start| {
        match (start.date_time, start.date) {
            (Some(dt), _) => DateTime::parse_from_rfc3339(&dt)
                .map_err(|e| warn!(event_id = %event.id, error = %e, "unparseable event start"))
                .ok()
                .map(EventStart::DateTime),
            (None, Some(date)) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| warn!(event_id = %event.id, error = %e, "unparseable event date"))
                .ok()
                .map(EventStart::Date),
            (None, None) => None,
        }
    });

    StoredEvent {
        id: event.id,
        start,
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the API, reduced to what the purge pass reads.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: String,
    start: Option<ApiEventTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

/// Response from the events.insert endpoint.
#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

/// Response from the calendarList endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarEntry>,
}
