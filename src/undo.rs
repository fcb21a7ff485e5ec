//! Undo engine: reverts the most recent organization run.
//!
//! Replays the persisted move log in reverse insertion order, moving each
//! file back to its original path. Undo is best-effort, not transactional:
//! records whose destination has vanished are skipped silently, restore
//! failures are collected without aborting, and a file already occupying an
//! original path is overwritten (the same last-writer-wins policy as forward
//! moves). After the replay the log is deleted — undo is single-shot, with
//! no redo.

use std::fs;
use std::path::{Path, PathBuf};

use crate::move_log::MoveLog;
use crate::organizer::{OrganizeError, OrganizeResult};

/// What an undo pass accomplished.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Original paths files were restored to, in restore order.
    pub restored: Vec<PathBuf>,
    /// Records skipped because the destination no longer existed.
    pub skipped: usize,
    /// Restores that failed, with the path and the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl UndoReport {
    /// True when nothing was skipped or failed.
    pub fn is_clean(&self) -> bool {
        self.skipped == 0 && self.failed.is_empty()
    }

    /// Total number of records processed.
    pub fn total(&self) -> usize {
        self.restored.len() + self.skipped + self.failed.len()
    }
}

/// Reverses the most recent run recorded in a directory's move log.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent organization of `base_path`.
    ///
    /// Fails with [`OrganizeError::NoLogFound`] when no log exists at the
    /// reserved path — a typed, recoverable condition, not a crash. The log
    /// file is deleted after the replay regardless of skips, retiring the
    /// run.
    pub fn undo(base_path: &Path) -> OrganizeResult<UndoReport> {
        if !base_path.is_dir() {
            return Err(OrganizeError::InvalidSourceDir {
                path: base_path.to_path_buf(),
            });
        }

        let log = MoveLog::load(base_path)?.ok_or_else(|| OrganizeError::NoLogFound {
            path: MoveLog::log_file_path(base_path),
        })?;

        let mut report = UndoReport::default();
        // Last move first: a later move may have replaced a path an earlier
        // record restores to.
        for record in log.records().iter().rev() {
            if !record.destination.exists() {
                report.skipped += 1;
                continue;
            }
            match fs::rename(&record.destination, &record.source) {
                Ok(()) => report.restored.push(record.source.clone()),
                Err(e) => report
                    .failed
                    .push((record.destination.clone(), e.to_string())),
            }
        }

        MoveLog::delete(base_path)?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, CustomRules, SortMode};
    use crate::organizer::Organizer;
    use tempfile::TempDir;

    fn organize_by_extension(base: &Path) {
        Organizer::new(base, Classifier::new(SortMode::Extension, CustomRules::new()))
            .organize(false, |_| {})
            .expect("organize");
    }

    #[test]
    fn test_undo_without_log_is_typed_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = UndoManager::undo(temp_dir.path());
        assert!(matches!(result, Err(OrganizeError::NoLogFound { .. })));
    }

    #[test]
    fn test_undo_invalid_base_path() {
        let result = UndoManager::undo(Path::new("/no/such/directory"));
        assert!(matches!(
            result,
            Err(OrganizeError::InvalidSourceDir { .. })
        ));
    }

    #[test]
    fn test_undo_restores_and_retires_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.txt"), "a").expect("write file");
        fs::write(base.join("b.pdf"), "b").expect("write file");
        organize_by_extension(base);

        let report = UndoManager::undo(base).expect("undo");

        assert_eq!(report.restored.len(), 2);
        assert!(report.is_clean());
        assert!(base.join("a.txt").exists());
        assert!(base.join("b.pdf").exists());
        assert!(!base.join("TXT").join("a.txt").exists());
        assert!(!MoveLog::log_file_path(base).exists());
    }

    #[test]
    fn test_undo_skips_vanished_destinations() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("gone.txt"), "x").expect("write file");
        organize_by_extension(base);
        fs::remove_file(base.join("TXT").join("gone.txt")).expect("remove moved file");

        let report = UndoManager::undo(base).expect("undo");

        assert!(report.restored.is_empty());
        assert_eq!(report.skipped, 1);
        // The log is retired even when records were skipped.
        assert!(!MoveLog::log_file_path(base).exists());
    }

    #[test]
    fn test_undo_overwrites_reoccupied_original_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("doc.txt"), "original").expect("write file");
        organize_by_extension(base);

        // Something reoccupied the original path since the run.
        fs::write(base.join("doc.txt"), "intruder").expect("write file");

        let report = UndoManager::undo(base).expect("undo");

        assert_eq!(report.restored.len(), 1);
        let contents = fs::read_to_string(base.join("doc.txt")).expect("read");
        assert_eq!(contents, "original");
    }

    #[test]
    fn test_undo_is_single_shot() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("once.txt"), "x").expect("write file");
        organize_by_extension(base);

        UndoManager::undo(base).expect("first undo");
        let second = UndoManager::undo(base);
        assert!(matches!(second, Err(OrganizeError::NoLogFound { .. })));
    }
}
