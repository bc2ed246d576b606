use crate::types::{Result, SieveError};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parse a persisted or user-supplied timestamp, normalized to UTC.
/// Naive values (no offset) are assumed UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(aware) => Ok(aware.with_timezone(&Utc)),
        Err(err) => NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .map_err(|_| SieveError::Timestamp {
                value: value.to_string(),
                source: err,
            }),
    }
}

/// Read the last processed publish time. A missing or empty file means no
/// previous run; a malformed value is fatal.
pub fn load(path: &Path) -> Result<Option<DateTime<Utc>>> {
    if !path.exists() {
        debug!("No checkpoint file at {}", path.display());
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    parse_timestamp(trimmed).map(Some)
}

/// Overwrite the checkpoint with the new boundary, creating parent
/// directories as needed.
pub fn save(path: &Path, value: DateTime<Utc>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, value.to_rfc3339())?;
    Ok(())
}
