//! The persisted move log for exactly one organization run.
//!
//! Each real (non-preview) run writes one plain-text log at a fixed location
//! inside the source directory, one record per line:
//!
//! ```text
//! /src/photo.jpg → /src/JPG/photo.jpg
//! ```
//!
//! The log is consumed in reverse insertion order by the undo engine and
//! deleted afterwards. Saving replaces any prior log wholesale, so at most
//! one run per directory is ever reversible. Paths that themselves contain
//! the record separator sequence are unsupported; such lines are skipped on
//! load rather than mis-parsed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::organizer::{OrganizeError, OrganizeResult};

/// File name of the persisted log, reserved inside the source directory.
pub const LOG_FILE_NAME: &str = "organizer_log.txt";

/// Separator between the source and destination paths on each log line.
const RECORD_SEPARATOR: &str = " → ";

/// One logged move: where a file was, and where it went.
///
/// The destination's parent directory is always `source_dir/<folder>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Ordered, append-only record of the moves performed in one run.
///
/// Ordering matters: undo must replay records in exactly the reverse order,
/// because later moves may have replaced destinations that earlier undos
/// depend on.
#[derive(Debug, Clone)]
pub struct MoveLog {
    base_path: PathBuf,
    records: Vec<MoveRecord>,
}

impl MoveLog {
    /// Creates an empty log for a run over `base_path`.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            records: Vec::new(),
        }
    }

    /// The reserved log location inside a source directory.
    pub fn log_file_path(base_path: &Path) -> PathBuf {
        base_path.join(LOG_FILE_NAME)
    }

    /// Appends a record in move order.
    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    /// Records in insertion (move) order.
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persists the log at the reserved path, replacing any prior content.
    pub fn save(&self) -> OrganizeResult<()> {
        let path = Self::log_file_path(&self.base_path);
        let mut contents = String::new();
        for record in &self.records {
            contents.push_str(&format!(
                "{}{}{}\n",
                record.source.display(),
                RECORD_SEPARATOR,
                record.destination.display()
            ));
        }
        fs::write(&path, contents).map_err(|e| OrganizeError::LogWriteFailed { path, source: e })
    }

    /// Loads the persisted log for a directory, or `None` when no log exists.
    ///
    /// Blank lines and lines that do not split into exactly one source and
    /// one destination are skipped.
    pub fn load(base_path: &Path) -> OrganizeResult<Option<Self>> {
        let path = Self::log_file_path(base_path);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path).map_err(|e| OrganizeError::LogReadFailed {
            path: path.clone(),
            source: e,
        })?;

        let mut records = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split(RECORD_SEPARATOR).collect();
            if parts.len() == 2 {
                records.push(MoveRecord {
                    source: PathBuf::from(parts[0]),
                    destination: PathBuf::from(parts[1]),
                });
            }
        }

        Ok(Some(Self {
            base_path: base_path.to_path_buf(),
            records,
        }))
    }

    /// Deletes the persisted log, retiring the run.
    pub fn delete(base_path: &Path) -> OrganizeResult<()> {
        let path = Self::log_file_path(base_path);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| OrganizeError::LogWriteFailed { path, source: e })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_preserves_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let mut log = MoveLog::new(base.to_path_buf());
        log.push(MoveRecord {
            source: base.join("a.txt"),
            destination: base.join("TXT").join("a.txt"),
        });
        log.push(MoveRecord {
            source: base.join("b.pdf"),
            destination: base.join("PDF").join("b.pdf"),
        });
        log.save().expect("save");

        let loaded = MoveLog::load(base).expect("load").expect("log exists");
        assert_eq!(loaded.records(), log.records());
    }

    #[test]
    fn test_load_missing_log_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(MoveLog::load(temp_dir.path()).expect("load").is_none());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(
            MoveLog::log_file_path(base),
            format!(
                "not a record\n\n{} → {}\na → b → c\n",
                base.join("x.txt").display(),
                base.join("TXT").join("x.txt").display()
            ),
        )
        .expect("write log");

        let loaded = MoveLog::load(base).expect("load").expect("log exists");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0].source, base.join("x.txt"));
    }

    #[test]
    fn test_save_replaces_prior_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(MoveLog::log_file_path(base), "stale contents").expect("write log");

        let log = MoveLog::new(base.to_path_buf());
        log.save().expect("save");

        let contents = fs::read_to_string(MoveLog::log_file_path(base)).expect("read");
        assert!(contents.is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        MoveLog::delete(base).expect("delete with no log is fine");
        fs::write(MoveLog::log_file_path(base), "x → y\n").expect("write log");
        MoveLog::delete(base).expect("delete");
        assert!(!MoveLog::log_file_path(base).exists());
    }
}
