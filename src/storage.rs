//! Persistence for run records and exported artifacts.
//!
//! Auto-saved records live under the per-user data directory; explicit
//! exports go wherever the caller points them.

use crate::model::RunRecord;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "power-market-cli";

/// Directory run records are auto-saved into, created on demand.
fn runs_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("no user data directory available")?;
    let dir = base.join(APP_DIR).join("runs");
    fs::create_dir_all(&dir)
        .with_context(|| format!("create runs directory {}", dir.display()))?;
    Ok(dir)
}

/// Turn an RFC 3339 timestamp into something filename-safe.
fn sanitize_timestamp(ts: &str) -> String {
    ts.replace(':', "-").replace('T', "_")
}

fn record_file_name(record: &RunRecord) -> String {
    format!(
        "power-market-{}-{}.json",
        sanitize_timestamp(&record.timestamp_utc),
        &record.run_id[..8.min(record.run_id.len())]
    )
}

/// Save a run record to the default auto-save location and return its path.
pub fn save_run(record: &RunRecord) -> Result<PathBuf> {
    let path = runs_dir()?.join(record_file_name(record));
    export_json(&path, record)?;
    Ok(path)
}

/// Write a run record as pretty JSON to an explicit path.
pub fn export_json(path: &Path, record: &RunRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("serialize run record")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write already-rendered CSV text to an explicit path.
pub fn export_csv(path: &Path, csv: &str) -> Result<()> {
    fs::write(path, csv).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
