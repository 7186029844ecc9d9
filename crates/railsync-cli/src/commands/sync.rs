//! The `sync` command.

use std::path::PathBuf;

use railsync_core::ReservationRecord;
use railsync_providers::GoogleCalendarStore;
use railsync_sync::{SyncReport, Synchronizer};

use crate::config::AppConfig;
use crate::error::CliResult;
use crate::store;

/// Synchronizes an in-memory reservation set.
pub async fn sync_records(
    config: &AppConfig,
    records: &[ReservationRecord],
    debug: bool,
    no_clear: bool,
    calendar: Option<String>,
) -> CliResult<SyncReport> {
    let google = GoogleCalendarStore::connect(&config.google_config()).await?;
    let options = config.sync_options(debug, no_clear, calendar);

    let synchronizer = Synchronizer::new(&google, options);
    let report = synchronizer.sync(records).await?;

    println!("{report}");
    Ok(report)
}

/// Reads the reservation file and synchronizes it.
pub async fn run(
    config: &AppConfig,
    input: Option<PathBuf>,
    debug: bool,
    no_clear: bool,
    calendar: Option<String>,
) -> CliResult<()> {
    let path = input.unwrap_or_else(store::default_reservations_path);
    let records = store::load_reservations(&path)?;
    sync_records(config, &records, debug, no_clear, calendar).await?;
    Ok(())
}
