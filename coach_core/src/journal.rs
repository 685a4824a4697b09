//! Activity journal for session mutations.
//!
//! Each successful session-affecting command is appended to a JSONL file
//! under an exclusive lock. The journal is an audit trail; the store stays
//! the source of truth.

use crate::types::{SessionId, UserId};
use crate::Result;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub const JOURNAL_DIR_NAME: &str = "journal";
pub const JOURNAL_FILE_NAME: &str = "activity.jsonl";

/// One recorded session mutation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    pub at: DateTime<Utc>,
    pub actor: UserId,
    pub session_id: SessionId,
    /// Short verb such as `session.create` or `set.complete`
    pub action: String,
}

impl ActivityEntry {
    pub fn now(actor: &UserId, session_id: SessionId, action: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            actor: actor.clone(),
            session_id,
            action: action.into(),
        }
    }
}

/// Destination for activity entries
pub trait ActivitySink {
    fn append(&mut self, entry: &ActivityEntry) -> Result<()>;
}

/// JSONL journal with file locking
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Journal at the standard location inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(journal_path(data_dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn journal_path(data_dir: &Path) -> PathBuf {
    data_dir.join(JOURNAL_DIR_NAME).join(JOURNAL_FILE_NAME)
}

impl ActivitySink for JsonlJournal {
    fn append(&mut self, entry: &ActivityEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;
        tracing::debug!("Journaled {} on session {}", entry.action, entry.session_id);
        Ok(())
    }
}

/// Read all entries; lines that fail to parse are skipped with a warning
pub fn read_activity(path: &Path) -> Result<Vec<ActivityEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut entries = Vec::new();
    for (line_num, line) in BufReader::new(&file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ActivityEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(
                "Skipping corrupt journal line {} in {:?}: {}",
                line_num + 1,
                path,
                e
            ),
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} journal entries", entries.len());
    Ok(entries)
}
