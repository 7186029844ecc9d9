//! Provider capabilities for the reservation sync engine.
//!
//! Two capability boundaries live here, each with a production
//! implementation:
//!
//! - [`browser::BrowserSession`] — a navigable portal session, implemented
//!   over the WebDriver protocol in [`webdriver`], driven by the fetch
//!   orchestrator in [`portal`].
//! - [`store::CalendarStore`] — a remote calendar, implemented against the
//!   Google Calendar API in [`google`].

pub mod browser;
pub mod error;
pub mod google;
pub mod portal;
pub mod store;
pub mod webdriver;

pub use browser::{BoxFuture, BrowserSession, ElementHandle, SessionFactory};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use google::{GoogleCalendarStore, GoogleConfig};
pub use portal::{PortalConfig, ReservationFetcher, RetryPolicy};
pub use store::{
    CalendarEntry, CalendarStore, EventPage, EventPayload, EventStamp, EventStart, StoredEvent,
};
pub use webdriver::{WebDriverConfig, WebDriverFactory, WebDriverSession};
