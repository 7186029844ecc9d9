//! Reservation fetch orchestrator.
//!
//! One attempt is the whole unit: authenticate, open the purchase-history
//! view, enumerate and filter months, and walk every listing page of every
//! retained month. Session-level failures (missing login inputs, navigation
//! timeouts, transport faults) tear the session down and re-run the whole
//! attempt after a fixed backoff, up to a small ceiling. An exhausted
//! ceiling reports "no data" rather than an error; anything else
//! propagates.

use std::time::Duration;

use chrono::Local;
use tracing::{info, warn};

use railsync_core::{ReservationRecord, normalize_records};

use crate::browser::{BrowserSession, SessionFactory};
use crate::error::{ProviderError, ProviderResult};
use crate::portal::config::{Credentials, PortalConfig};
use crate::portal::months::filter_months;
use crate::portal::walker::walk_listing_pages;

const LOGIN_ID: &str = "#loginId";
const LOGIN_PASSWORD: &str = "#password";
const LOGIN_SUBMIT: &str = "#submit";
const MENU_BUTTON: &str = ".menuBtn";
const HISTORY_LINK_TEXT: &str = "購入履歴";
const MONTH_SELECT: &str = "#useInquiryDate";
const DISPLAY_BUTTON: &str = "#displayBtn";

/// Bounded-retry policy wrapped around a single fetch attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt ceiling, including the first attempt.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(10),
        }
    }
}

/// Crawls the portal's purchase history into normalized records.
pub struct ReservationFetcher<F> {
    factory: F,
    config: PortalConfig,
    policy: RetryPolicy,
}

impl<F: SessionFactory> ReservationFetcher<F> {
    /// Creates a fetcher with the default retry policy.
    pub fn new(factory: F, config: PortalConfig) -> Self {
        Self {
            factory,
            config,
            policy: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs the fetch to completion.
    ///
    /// Returns `Ok(None)` when every attempt failed at the session level;
    /// non-session errors propagate immediately.
    pub async fn run(&self) -> ProviderResult<Option<Vec<ReservationRecord>>> {
        let credentials = Credentials::load(&self.config.credentials_path)?;
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.attempt(&credentials).await {
                Ok(records) => {
                    info!(count = records.len(), "fetch complete");
                    return Ok(Some(normalize_records(&records)));
                }
                Err(e) if e.is_session_retryable() => {
                    warn!(attempt, error = %e, "fetch attempt failed");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            attempts = max_attempts,
            "fetch retries exhausted, reporting no data"
        );
        Ok(None)
    }

    /// One attempt: open a fresh session, crawl, always close.
    async fn attempt(&self, credentials: &Credentials) -> ProviderResult<Vec<ReservationRecord>> {
        let session = self.factory.open().await?;
        let result = self.crawl(session.as_ref(), credentials).await;
        if let Err(e) = session.close().await {
            warn!(error = %e, "session close failed");
        }
        result
    }

    async fn crawl(
        &self,
        session: &dyn BrowserSession,
        credentials: &Credentials,
    ) -> ProviderResult<Vec<ReservationRecord>> {
        let settle = self.config.page_settle;
        let timeout = self.config.wait_timeout;

        session.navigate(&self.config.login_url).await?;
        tokio::time::sleep(settle).await;

        let login_id = session
            .find(LOGIN_ID)
            .await?
            .ok_or_else(|| ProviderError::login_input_missing("login id field absent"))?;
        let password = session
            .find(LOGIN_PASSWORD)
            .await?
            .ok_or_else(|| ProviderError::login_input_missing("password field absent"))?;
        let submit = session
            .find(LOGIN_SUBMIT)
            .await?
            .ok_or_else(|| ProviderError::login_input_missing("submit button absent"))?;

        session.send_keys(&login_id, &credentials.username).await?;
        session.send_keys(&password, &credentials.password).await?;
        session.click(&submit).await?;
        tokio::time::sleep(settle * 2).await;

        let menu = session.wait_for(MENU_BUTTON, timeout).await?;
        session.click(&menu).await?;
        tokio::time::sleep(settle / 2).await;

        let history = session.wait_for_link(HISTORY_LINK_TEXT, timeout).await?;
        session.click(&history).await?;
        tokio::time::sleep(settle * 3 / 2).await;

        session.wait_for(MONTH_SELECT, timeout).await?;
        let tokens = session.select_values(MONTH_SELECT).await?;
        let months = filter_months(tokens, Local::now().date_naive());
        info!(months = ?months, "querying purchase history");

        let mut records = Vec::new();
        for month in &months {
            session.wait_for(MONTH_SELECT, timeout).await?;
            session.select_by_value(MONTH_SELECT, month).await?;

            let display = session.wait_for(DISPLAY_BUTTON, timeout).await?;
            session.click(&display).await?;
            tokio::time::sleep(settle * 3 / 2).await;

            let month_records = walk_listing_pages(session, settle).await?;
            info!(month = %month, count = month_records.len(), "month walked");
            records.extend(month_records);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BoxFuture, ElementHandle};
    use crate::error::ProviderErrorCode;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    struct FakePage {
        url: String,
        html: String,
        next_href: Option<String>,
    }

    #[derive(Default)]
    struct FakeState {
        index: usize,
        typed: Vec<(String, String)>,
        clicked: Vec<String>,
        selected: Vec<String>,
        closed: bool,
    }

    #[derive(Clone)]
    struct FakeSession {
        pages: Arc<Vec<FakePage>>,
        months: Vec<String>,
        missing_login: bool,
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeSession {
        fn new(pages: Vec<FakePage>, months: Vec<&str>) -> Self {
            Self {
                pages: Arc::new(pages),
                months: months.into_iter().map(String::from).collect(),
                missing_login: false,
                state: Arc::new(Mutex::new(FakeState::default())),
            }
        }
    }

    impl BrowserSession for FakeSession {
        fn navigate(&self, url: &str) -> BoxFuture<'_, ProviderResult<()>> {
            let url = url.to_string();
            Box::pin(async move {
                if let Some(pos) = self.pages.iter().position(|p| p.url == url) {
                    self.state.lock().unwrap().index = pos;
                }
                Ok(())
            })
        }

        fn current_url(&self) -> BoxFuture<'_, ProviderResult<String>> {
            Box::pin(async move {
                let index = self.state.lock().unwrap().index;
                Ok(self.pages[index].url.clone())
            })
        }

        fn page_source(&self) -> BoxFuture<'_, ProviderResult<String>> {
            Box::pin(async move {
                let index = self.state.lock().unwrap().index;
                Ok(self.pages[index].html.clone())
            })
        }

        fn find(&self, selector: &str) -> BoxFuture<'_, ProviderResult<Option<ElementHandle>>> {
            let selector = selector.to_string();
            Box::pin(async move {
                let found = match selector.as_str() {
                    LOGIN_ID | LOGIN_PASSWORD | LOGIN_SUBMIT => !self.missing_login,
                    "#next" => {
                        let index = self.state.lock().unwrap().index;
                        self.pages[index].next_href.is_some()
                    }
                    MENU_BUTTON | MONTH_SELECT | DISPLAY_BUTTON => true,
                    _ => false,
                };
                Ok(found.then(|| ElementHandle::new(selector)))
            })
        }

        fn wait_for(
            &self,
            selector: &str,
            _timeout: Duration,
        ) -> BoxFuture<'_, ProviderResult<ElementHandle>> {
            let selector = selector.to_string();
            Box::pin(async move {
                self.find(&selector).await?.ok_or_else(|| {
                    ProviderError::navigation_timeout(format!("`{selector}` never appeared"))
                })
            })
        }

        fn wait_for_link(
            &self,
            text: &str,
            _timeout: Duration,
        ) -> BoxFuture<'_, ProviderResult<ElementHandle>> {
            let text = text.to_string();
            Box::pin(async move { Ok(ElementHandle::new(format!("link:{text}"))) })
        }

        fn click(&self, element: &ElementHandle) -> BoxFuture<'_, ProviderResult<()>> {
            let id = element.id().to_string();
            Box::pin(async move {
                self.state.lock().unwrap().clicked.push(id);
                Ok(())
            })
        }

        fn send_keys(
            &self,
            element: &ElementHandle,
            text: &str,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            let entry = (element.id().to_string(), text.to_string());
            Box::pin(async move {
                self.state.lock().unwrap().typed.push(entry);
                Ok(())
            })
        }

        fn attribute(
            &self,
            element: &ElementHandle,
            name: &str,
        ) -> BoxFuture<'_, ProviderResult<Option<String>>> {
            let wants_href = element.id() == "#next" && name == "href";
            Box::pin(async move {
                if !wants_href {
                    return Ok(None);
                }
                let index = self.state.lock().unwrap().index;
                Ok(self.pages[index].next_href.clone())
            })
        }

        fn select_values(&self, _selector: &str) -> BoxFuture<'_, ProviderResult<Vec<String>>> {
            Box::pin(async move { Ok(self.months.clone()) })
        }

        fn select_by_value(
            &self,
            _selector: &str,
            value: &str,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            let value = value.to_string();
            Box::pin(async move {
                self.state.lock().unwrap().selected.push(value);
                Ok(())
            })
        }

        fn close(&self) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async move {
                self.state.lock().unwrap().closed = true;
                Ok(())
            })
        }
    }

    struct FakeFactory {
        session: FakeSession,
        failures_before_success: Arc<Mutex<u32>>,
    }

    impl FakeFactory {
        fn new(session: FakeSession) -> Self {
            Self {
                session,
                failures_before_success: Arc::new(Mutex::new(0)),
            }
        }

        fn failing_first(session: FakeSession, failures: u32) -> Self {
            Self {
                session,
                failures_before_success: Arc::new(Mutex::new(failures)),
            }
        }
    }

    impl SessionFactory for FakeFactory {
        fn open(&self) -> BoxFuture<'_, ProviderResult<Box<dyn BrowserSession>>> {
            Box::pin(async move {
                let mut left = self.failures_before_success.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(ProviderError::transport("automation endpoint unreachable"));
                }
                self.session.state.lock().unwrap().index = 0;
                Ok(Box::new(self.session.clone()) as Box<dyn BrowserSession>)
            })
        }
    }

    fn anchor_page_html(purchase_id: &str) -> String {
        format!(
            r#"<html><body><div class="pdg-10">
                <div class="contentItem">{purchase_id}</div>
                <div class="catgory item"><div class="value">2024年6月1日</div></div>
                <div class="detailsArea">
                    <div class="item"><div class="value">2024年6月10日(月)</div></div>
                    <div class="item"><div class="value">スペーシアX 3号</div></div>
                    <div class="item"></div>
                    <div class="item"><div class="value">2名</div></div>
                    <div class="item"><div class="value">0名</div></div>
                    <div class="item"><div class="value">5,800円</div></div>
                </div>
            </div></body></html>"#
        )
    }

    fn two_page_session() -> FakeSession {
        let pages = vec![
            FakePage {
                url: "https://portal.test/history.xhtml".to_string(),
                html: anchor_page_html("ＳＭＺ０００１"),
                next_href: Some("history2.xhtml".to_string()),
            },
            FakePage {
                url: "https://portal.test/history2.xhtml".to_string(),
                html: anchor_page_html("ＳＭＺ０００２"),
                next_href: None,
            },
        ];
        FakeSession::new(pages, vec!["today", "currentMonth"])
    }

    fn test_config(credentials: &tempfile::NamedTempFile) -> PortalConfig {
        PortalConfig {
            login_url: "https://portal.test/login.xhtml".to_string(),
            credentials_path: credentials.path().to_path_buf(),
            page_settle: Duration::ZERO,
            wait_timeout: Duration::ZERO,
        }
    }

    fn credentials_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rider@example.com").unwrap();
        writeln!(file, "hunter2").unwrap();
        file
    }

    fn quick_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn crawls_all_pages_and_normalizes() {
        let session = two_page_session();
        let creds = credentials_file();
        let fetcher = ReservationFetcher::new(FakeFactory::new(session.clone()), test_config(&creds))
            .with_retry_policy(quick_retry());

        let records = fetcher.run().await.unwrap().unwrap();
        assert_eq!(records.len(), 2);
        // Full-width purchase ids come back normalized.
        assert_eq!(records[0].purchase_id, "SMZ0001");
        assert_eq!(records[1].purchase_id, "SMZ0002");

        let state = session.state.lock().unwrap();
        assert!(state.typed.contains(&(LOGIN_ID.to_string(), "rider@example.com".to_string())));
        assert!(state.typed.contains(&(LOGIN_PASSWORD.to_string(), "hunter2".to_string())));
        // The single-day option never gets queried.
        assert_eq!(state.selected, vec!["currentMonth"]);
        assert!(state.closed);
    }

    #[tokio::test]
    async fn retries_after_transport_failure() {
        let session = two_page_session();
        let creds = credentials_file();
        let fetcher =
            ReservationFetcher::new(FakeFactory::failing_first(session, 1), test_config(&creds))
                .with_retry_policy(quick_retry());

        let records = fetcher.run().await.unwrap();
        assert_eq!(records.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_report_no_data() {
        let session = two_page_session();
        let creds = credentials_file();
        let fetcher =
            ReservationFetcher::new(FakeFactory::failing_first(session, 10), test_config(&creds))
                .with_retry_policy(quick_retry());

        assert!(fetcher.run().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_login_inputs_are_session_level() {
        let mut session = two_page_session();
        session.missing_login = true;
        let creds = credentials_file();
        let fetcher = ReservationFetcher::new(FakeFactory::new(session), test_config(&creds))
            .with_retry_policy(RetryPolicy {
                max_attempts: 1,
                backoff: Duration::ZERO,
            });

        assert!(fetcher.run().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unreadable_credentials_propagate() {
        let session = two_page_session();
        let creds = credentials_file();
        let mut config = test_config(&creds);
        config.credentials_path = "/nonexistent/login.txt".into();
        let fetcher = ReservationFetcher::new(FakeFactory::new(session), config);

        let err = fetcher.run().await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }
}
