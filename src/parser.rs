use crate::types::{FeedEntry, NewEntries, Result, SieveError};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use tracing::debug;

/// Parse the fetched document and keep the entries that still need
/// processing.
///
/// The running maximum of published times is taken over every parsed entry,
/// filtered or not, and starts from the loaded checkpoint so it can only
/// move forward. Survivors come back sorted oldest first.
pub fn select_new_entries(
    content: &str,
    checkpoint: Option<DateTime<Utc>>,
    cutoff: Option<DateTime<Utc>>,
) -> Result<NewEntries> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| SieveError::Parse(format!("Failed to parse feed: {}", e)))?;

    let mut entries = Vec::new();
    let mut latest_published = checkpoint;

    for entry in feed.entries {
        let published_at = match entry.published {
            Some(ts) => ts,
            None => {
                debug!("Skipping entry without published time: {}", entry.id);
                continue;
            }
        };

        if latest_published.map_or(true, |seen| published_at > seen) {
            latest_published = Some(published_at);
        }

        if checkpoint.map_or(false, |boundary| published_at <= boundary) {
            continue; // already processed on an earlier run
        }
        if cutoff.map_or(false, |bound| published_at >= bound) {
            continue;
        }

        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());
        let summary = entry.summary.map(|s| s.content).unwrap_or_default();

        entries.push(FeedEntry {
            title,
            summary,
            published_at,
        });
    }

    // Oldest first, so downstream order follows publication order.
    entries.sort_by_key(|entry| entry.published_at);

    Ok(NewEntries {
        entries,
        latest_published,
    })
}
