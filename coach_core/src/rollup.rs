//! Roll the activity journal up into a CSV archive.
//!
//! The CSV is fsynced before the journal is renamed, so an interrupted rollup
//! can at worst leave entries in both places, never in neither.

use crate::journal::{read_activity, ActivityEntry};
use crate::Result;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const ACTIVITY_CSV_NAME: &str = "activity.csv";

#[derive(Debug, serde::Serialize)]
struct CsvRow {
    at: String,
    actor: String,
    session_id: String,
    action: String,
}

impl From<&ActivityEntry> for CsvRow {
    fn from(entry: &ActivityEntry) -> Self {
        CsvRow {
            at: entry.at.to_rfc3339(),
            actor: entry.actor.to_string(),
            session_id: entry.session_id.to_string(),
            action: entry.action.clone(),
        }
    }
}

/// Path the journal is renamed to once rolled up
pub fn processed_path(journal_path: &Path) -> PathBuf {
    journal_path.with_extension("jsonl.processed")
}

/// Append journal entries to the CSV and archive the journal
///
/// Returns the number of entries written. An empty or missing journal is
/// left alone.
pub fn journal_to_csv_and_archive(journal_path: &Path, csv_path: &Path) -> Result<usize> {
    let entries = read_activity(journal_path)?;
    if entries.is_empty() {
        tracing::info!("No journal entries to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);
    for entry in &entries {
        writer.serialize(CsvRow::from(entry))?;
    }
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;
    tracing::info!("Wrote {} journal entries to {:?}", entries.len(), csv_path);

    let archived = processed_path(journal_path);
    std::fs::rename(journal_path, &archived)?;
    tracing::info!("Archived journal to {:?}", archived);

    Ok(entries.len())
}

/// Remove archived journals from `dir`
pub fn cleanup_processed_journals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "processed") {
            std::fs::remove_file(&path)?;
            tracing::debug!("Removed processed journal {:?}", path);
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed journals", count);
    }
    Ok(count)
}
