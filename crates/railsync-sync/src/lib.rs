//! Reservation-to-calendar synchronization.
//!
//! Turns a normalized reservation set into calendar mutations with
//! delete-then-reinsert semantics: purge every event in the months the
//! reservations touch, then insert events for the allowed-status subset,
//! isolating per-record failures into a [`SyncReport`].

pub mod event;
pub mod notify;
pub mod report;
pub mod sync;

pub use event::{ALLOWED_STATUSES, EventBuildError, build_event, is_allowed_status};
pub use notify::{NotifyConfig, notify};
pub use report::{RecordOutcome, RecordReport, SyncReport};
pub use sync::{SyncError, SyncOptions, Synchronizer, target_year_months};
