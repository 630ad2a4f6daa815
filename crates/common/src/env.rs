//! Environment/runtime helpers
//!
//! Startup sanity checks for the on-disk layout the service expects.

/// Ensure the data directory exists, creating it if missing.
pub async fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}
