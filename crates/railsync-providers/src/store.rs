//! Calendar store capability.
//!
//! [`CalendarStore`] is the boundary the synchronizer is written against:
//! list calendars, page through events, insert and delete. The production
//! implementation talks to Google Calendar ([`crate::google`]); tests
//! substitute an in-memory store.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use railsync_core::YearMonth;

use crate::browser::BoxFuture;
use crate::error::ProviderResult;

/// A calendar visible to the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Store-assigned calendar identifier.
    pub id: String,
    /// Display name, matched against the configured calendar name.
    #[serde(rename = "summary")]
    pub name: String,
}

/// The start of a stored event, either timed or all-day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStart {
    /// A timed event start with an offset.
    DateTime(DateTime<FixedOffset>),
    /// An all-day event start.
    Date(NaiveDate),
}

impl EventStart {
    /// Returns the calendar month this start falls in.
    pub fn year_month(&self) -> YearMonth {
        match self {
            Self::DateTime(dt) => YearMonth::from_date(dt.date_naive()),
            Self::Date(d) => YearMonth::from_date(*d),
        }
    }
}

/// An event already present in the store, as seen by the purge pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Store-assigned event identifier.
    pub id: String,
    /// Event start, absent for malformed entries.
    pub start: Option<EventStart>,
}

/// One page of a store event listing.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    /// Events on this page.
    pub events: Vec<StoredEvent>,
    /// Opaque cursor for the next page, absent on the last page.
    pub next_page_token: Option<String>,
}

/// A timestamp attached to an event boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStamp {
    /// Local wall-clock time, RFC 3339 without offset.
    #[serde(rename = "dateTime")]
    pub date_time: String,
    /// IANA time zone name resolving the wall-clock time.
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl EventStamp {
    /// Builds a stamp from a naive local time and a zone name.
    pub fn new(local: chrono::NaiveDateTime, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: local.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: time_zone.into(),
        }
    }
}

/// A new event to insert into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// One-line title.
    pub summary: String,
    /// Multi-line body.
    pub description: String,
    /// Free-form location string.
    pub location: String,
    /// Event start.
    pub start: EventStamp,
    /// Event end.
    pub end: EventStamp,
}

/// A remote calendar store.
pub trait CalendarStore: Send + Sync {
    /// Lists the calendars visible to the account.
    fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarEntry>>>;

    /// Lists one page of events on a calendar.
    ///
    /// Pass the `next_page_token` of the previous page to continue; `None`
    /// starts from the first page.
    fn list_events(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<EventPage>>;

    /// Inserts an event, returning its store-assigned id.
    fn insert_event(
        &self,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> BoxFuture<'_, ProviderResult<String>>;

    /// Deletes an event by id.
    fn delete_event(
        &self,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, ProviderResult<()>>;
}
