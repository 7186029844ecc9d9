//! The calendar synchronizer.
//!
//! Delete-then-reinsert: compute the target months from every input
//! reservation's ride date, purge existing events in those months, then
//! insert fresh events for the allowed-status subset. The purge bounds
//! deletions; the allow-list bounds insertions. Not atomic - a crash
//! mid-sync leaves the calendar partially purged.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{info, warn};

use railsync_core::{ReservationRecord, YearMonth, parse_ride_date};
use railsync_providers::{CalendarStore, ProviderError};

use crate::event::{build_event, is_allowed_status};
use crate::report::{RecordOutcome, RecordReport, SyncReport};

/// Options for one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Display name of the target calendar.
    pub calendar_name: String,
    /// Run the purge pass before inserting.
    pub clear: bool,
    /// Stop after the first insertion attempt, for manual verification.
    pub debug: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            calendar_name: "Smooz".to_string(),
            clear: true,
            debug: false,
        }
    }
}

/// A fatal synchronization failure.
///
/// Per-record insert/delete failures are not errors; they land in the
/// report. These abort the run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configured calendar name matched nothing. Raised before any
    /// mutation.
    #[error("calendar `{0}` not found")]
    CalendarNotFound(String),

    /// A store call that invalidates the whole run failed (calendar
    /// listing, event listing).
    #[error(transparent)]
    Store(#[from] ProviderError),
}

/// Reconciles a reservation set against one calendar.
pub struct Synchronizer<'a> {
    store: &'a dyn CalendarStore,
    options: SyncOptions,
}

impl<'a> Synchronizer<'a> {
    pub fn new(store: &'a dyn CalendarStore, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Runs the full synchronization.
    pub async fn sync(&self, reservations: &[ReservationRecord]) -> Result<SyncReport, SyncError> {
        let calendar_id = self.resolve_calendar().await?;
        let mut report = SyncReport::default();

        if self.options.clear {
            let months = target_year_months(reservations);
            report.deleted = self.purge_months(&calendar_id, &months).await?;
        }

        for record in reservations {
            let outcome = self.sync_record(&calendar_id, record).await;
            let attempted_insert = !matches!(outcome, RecordOutcome::Skipped { .. });
            report.records.push(RecordReport {
                purchase_id: record.purchase_id.clone(),
                outcome,
            });

            if self.options.debug && attempted_insert {
                info!("debug mode, stopping after first insertion attempt");
                break;
            }
        }

        info!(%report, "synchronization finished");
        Ok(report)
    }

    /// Finds the target calendar by display name.
    async fn resolve_calendar(&self) -> Result<String, SyncError> {
        let calendars = self.store.list_calendars().await?;
        calendars
            .into_iter()
            .find(|c| c.name == self.options.calendar_name)
            .map(|c| c.id)
            .ok_or_else(|| SyncError::CalendarNotFound(self.options.calendar_name.clone()))
    }

    /// Deletes every event whose start falls in a target month.
    ///
    /// The listing is a full calendar scan. A listing failure aborts the
    /// run; a single delete failure is logged and skipped.
    async fn purge_months(
        &self,
        calendar_id: &str,
        months: &HashSet<YearMonth>,
    ) -> Result<usize, SyncError> {
        let mut deleted = 0;
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_events(calendar_id, page_token.as_deref())
                .await?;

            for event in page.events {
                let Some(start) = event.start else { continue };
                if !months.contains(&start.year_month()) {
                    continue;
                }
                match self.store.delete_event(calendar_id, &event.id).await {
                    Ok(()) => deleted += 1,
                    Err(e) => warn!(event_id = %event.id, error = %e, "event delete failed"),
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(deleted, "purge pass complete");
        Ok(deleted)
    }

    /// Filters, builds, and inserts one reservation's event.
    async fn sync_record(&self, calendar_id: &str, record: &ReservationRecord) -> RecordOutcome {
        let status = record.status_text();
        if !is_allowed_status(&status) {
            return RecordOutcome::Skipped {
                reason: format!("status `{status}` not in allow-list"),
            };
        }

        let payload = match build_event(record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(purchase_id = %record.purchase_id, error = %e, "reservation skipped");
                return RecordOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        match self.store.insert_event(calendar_id, &payload).await {
            Ok(event_id) => {
                info!(purchase_id = %record.purchase_id, event_id, "event inserted");
                RecordOutcome::Inserted { event_id }
            }
            Err(e) => {
                warn!(purchase_id = %record.purchase_id, error = %e, "event insert failed");
                RecordOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Months touched by the input reservations, regardless of status.
///
/// A reservation whose ride date fails to parse contributes no month; its
/// true month is then never purged, which can leave stale events behind.
pub fn target_year_months(reservations: &[ReservationRecord]) -> HashSet<YearMonth> {
    let mut months = HashSet::new();
    for record in reservations {
        match parse_ride_date(record.ride_date_text()) {
            Some(date) => {
                months.insert(YearMonth::from_date(date));
            }
            None => warn!(
                purchase_id = %record.purchase_id,
                ride_date = %record.ride_date_text(),
                "ride date unparseable, month not purged"
            ),
        }
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{NaiveDate, NaiveDateTime};
    use railsync_providers::{
        BoxFuture, CalendarEntry, EventPage, EventPayload, EventStart, ProviderResult, StoredEvent,
    };
    use railsync_core::tokyo_offset;

    struct StoreState {
        events: Vec<StoredEvent>,
        listing: Option<Vec<StoredEvent>>,
        inserted: Vec<EventPayload>,
        deletes: Vec<String>,
        next_id: usize,
    }

    struct FakeStore {
        calendars: Vec<CalendarEntry>,
        page_size: usize,
        fail_insert_summaries: Vec<String>,
        state: Mutex<StoreState>,
    }

    impl FakeStore {
        fn new(calendar_name: &str) -> Self {
            Self {
                calendars: vec![CalendarEntry {
                    id: "cal-1".to_string(),
                    name: calendar_name.to_string(),
                }],
                page_size: 2,
                fail_insert_summaries: Vec::new(),
                state: Mutex::new(StoreState {
                    events: Vec::new(),
                    listing: None,
                    inserted: Vec::new(),
                    deletes: Vec::new(),
                    next_id: 0,
                }),
            }
        }

        fn seed_event(&self, id: &str, year: i32, month: u32, day: u32) {
            let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
            self.state.lock().unwrap().events.push(StoredEvent {
                id: id.to_string(),
                start: Some(EventStart::Date(date)),
            });
        }

        fn payload_start(payload: &EventPayload) -> EventStart {
            let local =
                NaiveDateTime::parse_from_str(&payload.start.date_time, "%Y-%m-%dT%H:%M:%S")
                    .unwrap();
            EventStart::DateTime(local.and_local_timezone(tokyo_offset()).unwrap())
        }

        fn event_ids(&self) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .events
                .iter()
                .map(|e| e.id.clone())
                .collect()
        }
    }

    impl CalendarStore for FakeStore {
        fn list_calendars(&self) -> BoxFuture<'_, ProviderResult<Vec<CalendarEntry>>> {
            Box::pin(async move { Ok(self.calendars.clone()) })
        }

        fn list_events(
            &self,
            _calendar_id: &str,
            page_token: Option<&str>,
        ) -> BoxFuture<'_, ProviderResult<EventPage>> {
            let offset: usize = page_token.map(|t| t.parse().unwrap()).unwrap_or(0);
            Box::pin(async move {
                let mut state = self.state.lock().unwrap();
                if offset == 0 {
                    state.listing = Some(state.events.clone());
                }
                let listing = state.listing.as_ref().unwrap();
                let end = (offset + self.page_size).min(listing.len());
                let events = listing[offset..end].to_vec();
                let next_page_token = (end < listing.len()).then(|| end.to_string());
                Ok(EventPage {
                    events,
                    next_page_token,
                })
            })
        }

        fn insert_event(
            &self,
            _calendar_id: &str,
            payload: &EventPayload,
        ) -> BoxFuture<'_, ProviderResult<String>> {
            let payload = payload.clone();
            Box::pin(async move {
                if self.fail_insert_summaries.contains(&payload.summary) {
                    return Err(ProviderError::server("insert rejected"));
                }
                let mut state = self.state.lock().unwrap();
                state.next_id += 1;
                let id = format!("ev-{}", state.next_id);
                state.events.push(StoredEvent {
                    id: id.clone(),
                    start: Some(Self::payload_start(&payload)),
                });
                state.inserted.push(payload);
                Ok(id)
            })
        }

        fn delete_event(
            &self,
            _calendar_id: &str,
            event_id: &str,
        ) -> BoxFuture<'_, ProviderResult<()>> {
            let event_id = event_id.to_string();
            Box::pin(async move {
                let mut state = self.state.lock().unwrap();
                state.events.retain(|e| e.id != event_id);
                state.deletes.push(event_id);
                Ok(())
            })
        }
    }

    fn record(purchase_id: &str, ride_date: &str, status: &str) -> ReservationRecord {
        ReservationRecord {
            ride_date: ride_date.into(),
            train_name: "スペーシアX 3号".into(),
            adult_count: "2名".into(),
            child_count: "0名".into(),
            amount: "5,800円".into(),
            car_number: "3号車".into(),
            seat: "12A".into(),
            departure_station: "浅草".into(),
            departure_time: "10:00発".into(),
            arrival_station: "東武日光".into(),
            arrival_time: "11:52着".into(),
            status: status.into(),
            ..ReservationRecord::new(purchase_id)
        }
    }

    fn options() -> SyncOptions {
        SyncOptions::default()
    }

    #[test]
    fn target_months_include_all_statuses() {
        let reservations = vec![
            record("SMZ0001", "2024年6月10日(月)", "購入済"),
            record("SMZ0002", "2024年7月2日(火)", "キャンセル"),
            record("SMZ0003", "未定", "購入済"),
        ];
        let months = target_year_months(&reservations);
        assert_eq!(
            months,
            HashSet::from([YearMonth::new(2024, 6), YearMonth::new(2024, 7)])
        );
    }

    #[tokio::test]
    async fn missing_calendar_aborts_before_mutation() {
        let store = FakeStore::new("Other");
        store.seed_event("stale-1", 2024, 6, 1);

        let reservations = vec![record("SMZ0001", "2024年6月10日(月)", "購入済")];
        let sync = Synchronizer::new(&store, options());
        let err = sync.sync(&reservations).await.unwrap_err();

        assert!(matches!(err, SyncError::CalendarNotFound(name) if name == "Smooz"));
        assert!(store.state.lock().unwrap().deletes.is_empty());
        assert!(store.state.lock().unwrap().inserted.is_empty());
    }

    #[tokio::test]
    async fn purge_removes_only_target_months() {
        let store = FakeStore::new("Smooz");
        store.seed_event("june-1", 2024, 6, 1);
        store.seed_event("june-2", 2024, 6, 20);
        store.seed_event("july-1", 2024, 7, 5);
        store.seed_event("may-1", 2024, 5, 30);

        // The cancelled record still contributes July to the purge set.
        let reservations = vec![
            record("SMZ0001", "2024年6月10日(月)", "購入済"),
            record("SMZ0002", "2024年7月2日(火)", "キャンセル"),
        ];
        let sync = Synchronizer::new(&store, options());
        let report = sync.sync(&reservations).await.unwrap();

        assert_eq!(report.deleted, 3);
        let ids = store.event_ids();
        assert!(ids.contains(&"may-1".to_string()));
        assert!(!ids.contains(&"june-1".to_string()));
        assert!(!ids.contains(&"july-1".to_string()));
    }

    #[tokio::test]
    async fn clear_disabled_skips_purge() {
        let store = FakeStore::new("Smooz");
        store.seed_event("june-1", 2024, 6, 1);

        let reservations = vec![record("SMZ0001", "2024年6月10日(月)", "購入済")];
        let sync = Synchronizer::new(
            &store,
            SyncOptions {
                clear: false,
                ..options()
            },
        );
        let report = sync.sync(&reservations).await.unwrap();

        assert_eq!(report.deleted, 0);
        assert!(store.event_ids().contains(&"june-1".to_string()));
    }

    #[tokio::test]
    async fn status_filter_admits_only_allow_list() {
        let store = FakeStore::new("Smooz");
        let reservations = vec![
            record("SMZ0001", "2024年6月10日(月)", "購入済"),
            record("SMZ0002", "2024年6月11日(火)", "運休払戻済"),
            record("SMZ0003", "2024年6月12日(水)", "乗車変更購入済"),
            record("SMZ0004", "2024年6月13日(木)", "キャンセル"),
        ];
        let sync = Synchronizer::new(&store, options());
        let report = sync.sync(&reservations).await.unwrap();

        assert_eq!(report.inserted(), 3);
        assert_eq!(report.skipped(), 1);

        let state = store.state.lock().unwrap();
        assert!(state.inserted[0].summary.starts_with("🚆 "));
        assert!(state.inserted[1].summary.starts_with("🚫 "));
        assert!(state.inserted[2].summary.starts_with("🚆 "));
    }

    #[tokio::test]
    async fn insert_failure_does_not_abort_batch() {
        let mut store = FakeStore::new("Smooz");
        store.fail_insert_summaries = vec!["🚆 浅草→東武日光 [3号車 12A]".to_string()];

        let reservations = vec![
            record("SMZ0001", "2024年6月10日(月)", "購入済"),
            record("SMZ0002", "2024年6月11日(火)", "運休払戻済"),
        ];
        let sync = Synchronizer::new(&store, options());
        let report = sync.sync(&reservations).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.inserted(), 1);
        assert!(matches!(
            report.records[0].outcome,
            RecordOutcome::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn unparseable_ride_date_is_skipped_not_failed() {
        let store = FakeStore::new("Smooz");
        let reservations = vec![
            record("SMZ0001", "未定", "購入済"),
            record("SMZ0002", "2024年6月11日(火)", "購入済"),
        ];
        let sync = Synchronizer::new(&store, options());
        let report = sync.sync(&reservations).await.unwrap();

        assert_eq!(report.skipped(), 1);
        assert_eq!(report.inserted(), 1);
    }

    #[tokio::test]
    async fn debug_stops_after_first_insertion_attempt() {
        let store = FakeStore::new("Smooz");
        let reservations = vec![
            record("SMZ0001", "2024年6月13日(木)", "キャンセル"),
            record("SMZ0002", "2024年6月10日(月)", "購入済"),
            record("SMZ0003", "2024年6月11日(火)", "購入済"),
        ];
        let sync = Synchronizer::new(
            &store,
            SyncOptions {
                debug: true,
                ..options()
            },
        );
        let report = sync.sync(&reservations).await.unwrap();

        // The filtered record does not count as an attempt.
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.inserted(), 1);
        assert_eq!(store.state.lock().unwrap().inserted.len(), 1);
    }

    #[tokio::test]
    async fn touched_months_end_up_with_exactly_the_admitted_set() {
        let store = FakeStore::new("Smooz");
        store.seed_event("stale-1", 2024, 6, 1);
        store.seed_event("stale-2", 2024, 6, 2);
        store.seed_event("stale-3", 2024, 6, 3);

        let reservations = vec![
            record("SMZ0001", "2024年6月10日(月)", "購入済"),
            record("SMZ0002", "2024年6月11日(火)", "キャンセル"),
            record("SMZ0003", "2024年6月12日(水)", "運休払戻済"),
        ];
        let sync = Synchronizer::new(&store, options());
        let report = sync.sync(&reservations).await.unwrap();

        assert_eq!(report.deleted, 3);
        assert_eq!(report.inserted(), 2);

        // Only the freshly inserted events remain in the touched month.
        let ids = store.event_ids();
        assert_eq!(ids, vec!["ev-1".to_string(), "ev-2".to_string()]);
    }
}
