//! Raw provider events saved to disk so a scan can be re-analyzed offline.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ingest::RawEvent;

/// Events exactly as the provider returned them, bookmakers included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events: Vec<RawEvent>,
}

pub async fn write_snapshot(path: impl AsRef<Path>, snapshot: &RawSnapshot) -> Result<()> {
    let body = serde_json::to_string_pretty(snapshot)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

pub async fn read_snapshot(path: impl AsRef<Path>) -> Result<RawSnapshot> {
    let body = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&body)?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;

    #[tokio::test]
    async fn snapshot_round_trips_through_ingestion() {
        let original = fixtures::snapshot();
        let path = std::env::temp_dir().join(format!("arb-raw-{}.json", std::process::id()));

        write_snapshot(&path, &original).await.unwrap();
        let restored = read_snapshot(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        assert_eq!(restored.timestamp, original.timestamp);
        assert_eq!(restored.events.len(), 1);
        assert_eq!(restored.events[0].bookmakers.len(), 2);

        let now = original.timestamp;
        let (before, _) = ingest::build_events(&original.events, now, true);
        let (after, _) = ingest::build_events(&restored.events, now, true);
        assert_eq!(before, after);
        assert_eq!(after[0].markets.len(), 2);
    }

    #[tokio::test]
    async fn missing_snapshot_is_an_error() {
        let path = std::env::temp_dir().join("arb-raw-does-not-exist.json");
        assert!(read_snapshot(&path).await.is_err());
    }
}
