//! The `fetch` command.

use std::path::PathBuf;

use tracing::info;

use railsync_core::ReservationRecord;
use railsync_providers::{ReservationFetcher, WebDriverFactory};

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};
use crate::store;

/// Crawls the portal, returning `None` when retries were exhausted.
pub async fn fetch_records(config: &AppConfig) -> CliResult<Option<Vec<ReservationRecord>>> {
    let factory = WebDriverFactory::new(config.webdriver_config());
    let fetcher = ReservationFetcher::new(factory, config.portal_config());
    Ok(fetcher.run().await?)
}

/// Fetches and writes the reservation file.
pub async fn run(config: &AppConfig, output: Option<PathBuf>) -> CliResult<()> {
    let Some(records) = fetch_records(config).await? else {
        return Err(CliError::NoData);
    };

    let path = output.unwrap_or_else(store::default_reservations_path);
    store::save_reservations(&path, &records)?;

    info!(count = records.len(), path = %path.display(), "reservations written");
    println!("{} reservations written to {}", records.len(), path.display());
    Ok(())
}
