use std::path::Path;

use crate::error::Result;
use crate::report::Report;

pub fn to_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write the report to `path`, replacing any previous snapshot.
pub async fn write_json(path: impl AsRef<Path>, report: &Report) -> Result<()> {
    let body = to_json(report)?;
    tokio::fs::write(path, body).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use chrono::Utc;

    #[tokio::test]
    async fn writes_parseable_snapshot() {
        let report = Report::build(
            &[fixtures::analysis("arb", "Knicks", "Nets", true)],
            1000.0,
            Utc::now(),
        );
        let path = std::env::temp_dir().join(format!("arb-report-{}.json", std::process::id()));

        write_json(&path, &report).await.unwrap();
        let body = tokio::fs::read_to_string(&path).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(value["timestamp"].is_string());
        assert_eq!(value["arbitrageOpportunities"][0]["id"], "arb");
    }
}
