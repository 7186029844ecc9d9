//! The reservation file.
//!
//! Fetch and sync can run as separate steps; the hand-off artifact is a
//! JSON array of reservation records, written atomically.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use railsync_core::ReservationRecord;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Default location of the reservation file.
pub fn default_reservations_path() -> PathBuf {
    AppConfig::default_data_dir().join("reservations.json")
}

/// Writes the reservation set, creating parent directories as needed.
pub fn save_reservations(path: &Path, records: &[ReservationRecord]) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(records)
        .map_err(|e| CliError::Data(format!("failed to serialize reservations: {}", e)))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content)?;
    fs::rename(&temp_path, path)?;

    debug!(path = %path.display(), count = records.len(), "reservations saved");
    Ok(())
}

/// Reads a reservation set back.
pub fn load_reservations(path: &Path) -> CliResult<Vec<ReservationRecord>> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::Data(format!("failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| CliError::Data(format!("failed to parse {}: {}", path.display(), e)))
}
