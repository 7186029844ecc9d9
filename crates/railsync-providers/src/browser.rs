//! Browsing/automation capability traits.
//!
//! [`BrowserSession`] is the boundary the fetch side is written against: a
//! navigable page with selector lookup, bounded waits, and form controls.
//! The production implementation drives a real browser over WebDriver
//! ([`crate::webdriver`]); tests substitute scripted fakes.
//!
//! [`SessionFactory`] exists because the retry policy tears the whole
//! session down between attempts - each attempt gets a fresh session.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Async functions in traits do not yet mix well with dynamic dispatch;
/// boxed futures keep the traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An opaque handle to a located page element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    /// Creates a handle from a provider-specific element id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the provider-specific element id.
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// A live browsing session against the portal.
///
/// All methods are blocking from the caller's point of view: the engine
/// awaits each call to completion before issuing the next.
pub trait BrowserSession: Send + Sync {
    /// Navigates to the given URL.
    fn navigate(&self, url: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Returns the URL of the current page.
    fn current_url(&self) -> BoxFuture<'_, ProviderResult<String>>;

    /// Returns the full markup of the current page.
    fn page_source(&self) -> BoxFuture<'_, ProviderResult<String>>;

    /// Finds the first element matching a CSS selector, if any.
    fn find(&self, selector: &str) -> BoxFuture<'_, ProviderResult<Option<ElementHandle>>>;

    /// Waits until an element matching the selector is present.
    ///
    /// # Errors
    ///
    /// Returns a `NavigationTimeout` error when the element never appears
    /// within the given timeout.
    fn wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> BoxFuture<'_, ProviderResult<ElementHandle>>;

    /// Waits until a link whose text contains the given fragment is present.
    ///
    /// # Errors
    ///
    /// Returns a `NavigationTimeout` error when no such link appears within
    /// the given timeout.
    fn wait_for_link(
        &self,
        text: &str,
        timeout: Duration,
    ) -> BoxFuture<'_, ProviderResult<ElementHandle>>;

    /// Clicks an element.
    fn click(&self, element: &ElementHandle) -> BoxFuture<'_, ProviderResult<()>>;

    /// Types text into an element.
    fn send_keys(&self, element: &ElementHandle, text: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Reads an attribute of an element, if set.
    fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> BoxFuture<'_, ProviderResult<Option<String>>>;

    /// Returns the `value` attribute of every option of a select element.
    fn select_values(&self, selector: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>>;

    /// Selects the option with the given value on a select element.
    fn select_by_value(&self, selector: &str, value: &str) -> BoxFuture<'_, ProviderResult<()>>;

    /// Releases the session and its remote resources.
    fn close(&self) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Creates fresh browsing sessions, one per fetch attempt.
pub trait SessionFactory: Send + Sync {
    /// Opens a new session.
    fn open(&self) -> BoxFuture<'_, ProviderResult<Box<dyn BrowserSession>>>;
}
