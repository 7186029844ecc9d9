//! The `run` command: fetch then sync in one pass.

use tracing::info;

use railsync_sync::notify;

use crate::commands::{fetch, sync};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

pub async fn run(config: &AppConfig, debug: bool, no_clear: bool) -> CliResult<()> {
    let notify_config = config.notify_config();

    let Some(records) = fetch::fetch_records(config).await? else {
        notify(
            &notify_config,
            "railsync",
            "reservation fetch failed, calendar left untouched",
        );
        return Err(CliError::NoData);
    };
    info!(count = records.len(), "reservations fetched");

    match sync::sync_records(config, &records, debug, no_clear, None).await {
        Ok(report) => {
            notify(
                &notify_config,
                "railsync",
                &format!("calendar updated: {report}"),
            );
            Ok(())
        }
        Err(e) => {
            notify(&notify_config, "railsync", &format!("sync failed: {e}"));
            Err(e)
        }
    }
}
