//! Organizer engine: walks a directory tree, classifies each regular file,
//! and either reports the intended move (preview) or performs it and records
//! it in the move log.
//!
//! Per-file failures never abort a run; they are surfaced as events and the
//! walk continues. Directory-level validation and log persistence failures
//! propagate as errors for the whole operation.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classifier::Classifier;
use crate::config::CompiledExcludes;
use crate::move_log::{MoveLog, MoveRecord};

/// Errors that can fail an organize or undo operation as a whole.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source path is missing or not a directory.
    InvalidSourceDir { path: PathBuf },
    /// Writing the move log failed. The most dangerous failure mode: files
    /// have already moved but the record needed to undo them may be lost.
    LogWriteFailed { path: PathBuf, source: std::io::Error },
    /// Reading the move log failed.
    LogReadFailed { path: PathBuf, source: std::io::Error },
    /// No move log exists at the reserved path; there is nothing to undo.
    NoLogFound { path: PathBuf },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourceDir { path } => {
                write!(f, "Invalid directory: {}", path.display())
            }
            Self::LogWriteFailed { path, source } => {
                write!(
                    f,
                    "Failed to write move log {}: {}",
                    path.display(),
                    source
                )
            }
            Self::LogReadFailed { path, source } => {
                write!(f, "Failed to read move log {}: {}", path.display(), source)
            }
            Self::NoLogFound { path } => {
                write!(f, "No move log found at {}", path.display())
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for organize and undo operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Per-file outcome emitted while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Preview mode: the file would be moved into `folder`.
    Previewed { name: String, folder: String },
    /// The file was moved into `folder` and recorded in the move log.
    Moved { name: String, folder: String },
    /// The file could not be processed; the run continues without it.
    Failed { name: String, reason: String },
}

/// Summary counts for one organize run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrganizeReport {
    /// Files moved and recorded in the log.
    pub moved: usize,
    /// Files reported in preview mode.
    pub previewed: usize,
    /// Files that failed and are absent from the log.
    pub failed: usize,
}

impl OrganizeReport {
    /// Total number of files processed.
    pub fn total(&self) -> usize {
        self.moved + self.previewed + self.failed
    }

    /// True when every discovered file was handled without error.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Walks a source directory and moves its files into classified subfolders.
///
/// One `Organizer` handles one run: it owns the classifier (and therefore the
/// custom rule set) and the compiled exclude filters for the run's lifetime.
pub struct Organizer {
    source_dir: PathBuf,
    classifier: Classifier,
    excludes: CompiledExcludes,
}

impl Organizer {
    /// Creates an organizer with no exclude filters (every regular file under
    /// the source directory is organized, hidden files included).
    pub fn new(source_dir: impl Into<PathBuf>, classifier: Classifier) -> Self {
        Self {
            source_dir: source_dir.into(),
            classifier,
            excludes: CompiledExcludes::allow_all(),
        }
    }

    /// Replaces the exclude filters applied during the walk.
    pub fn with_excludes(mut self, excludes: CompiledExcludes) -> Self {
        self.excludes = excludes;
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Runs one organization pass.
    ///
    /// In preview mode no file-system mutation happens at all: no directory
    /// is created, no file is moved, no log is written. In a real run each
    /// file is moved into `source_dir/<folder>/<file_name>`, replacing any
    /// existing file at that path (last writer wins), and the accumulated
    /// move log is persisted at the end, replacing any prior log.
    ///
    /// `on_event` receives one [`FileOutcome`] per discovered file as the run
    /// progresses. Per-file failures are reported through it and never abort
    /// the walk; only an invalid source directory or a log persistence
    /// failure fails the operation as a whole.
    pub fn organize(
        &self,
        preview: bool,
        mut on_event: impl FnMut(&FileOutcome),
    ) -> OrganizeResult<OrganizeReport> {
        if !self.source_dir.is_dir() {
            return Err(OrganizeError::InvalidSourceDir {
                path: self.source_dir.clone(),
            });
        }

        let mut report = OrganizeReport::default();
        let files = self.discover(&mut report, &mut on_event);

        let mut log = MoveLog::new(self.source_dir.clone());
        for path in &files {
            let name = display_name(path);
            match self.place_file(path, preview, &mut log) {
                Ok(folder) if preview => {
                    report.previewed += 1;
                    on_event(&FileOutcome::Previewed { name, folder });
                }
                Ok(folder) => {
                    report.moved += 1;
                    on_event(&FileOutcome::Moved { name, folder });
                }
                Err(reason) => {
                    report.failed += 1;
                    on_event(&FileOutcome::Failed { name, reason });
                }
            }
        }

        if !preview {
            log.save()?;
        }

        Ok(report)
    }

    /// Collects every regular file reachable from the source directory,
    /// excluding the reserved log file and anything matched by the exclude
    /// filters. The snapshot is taken before any move so freshly created
    /// category directories are never re-walked.
    fn discover(
        &self,
        report: &mut OrganizeReport,
        on_event: &mut impl FnMut(&FileOutcome),
    ) -> Vec<PathBuf> {
        let log_path = MoveLog::log_file_path(&self.source_dir);
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.source_dir) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let path = entry.into_path();
                    if path == log_path {
                        continue;
                    }
                    if !self.excludes.should_include(&path) {
                        continue;
                    }
                    files.push(path);
                }
                Ok(_) => {}
                Err(e) => {
                    let name = e
                        .path()
                        .map(display_name)
                        .unwrap_or_else(|| display_name(&self.source_dir));
                    report.failed += 1;
                    on_event(&FileOutcome::Failed {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        files
    }

    /// Classifies one file and, in a real run, moves it into place and
    /// records the move. Returns the folder name on success, or a reason
    /// string for the per-file failure event.
    fn place_file(
        &self,
        path: &Path,
        preview: bool,
        log: &mut MoveLog,
    ) -> Result<String, String> {
        let folder = self
            .classifier
            .folder_for(path)
            .map_err(|e| format!("could not classify: {}", e))?;

        if preview {
            return Ok(folder);
        }

        let target_dir = self.source_dir.join(&folder);
        fs::create_dir_all(&target_dir)
            .map_err(|e| format!("could not create {}: {}", target_dir.display(), e))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| "file has no name component".to_string())?;
        let destination = target_dir.join(file_name);

        // Last writer wins: an existing file at the destination is replaced.
        fs::rename(path, &destination)
            .map_err(|e| format!("could not move to {}: {}", destination.display(), e))?;

        log.push(MoveRecord {
            source: path.to_path_buf(),
            destination,
        });

        Ok(folder)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, CustomRules, SortMode};
    use std::fs;
    use tempfile::TempDir;

    fn extension_organizer(base: &Path) -> Organizer {
        Organizer::new(base, Classifier::new(SortMode::Extension, CustomRules::new()))
    }

    #[test]
    fn test_invalid_source_dir() {
        let organizer = extension_organizer(Path::new("/no/such/directory"));
        let result = organizer.organize(false, |_| {});
        assert!(matches!(result, Err(OrganizeError::InvalidSourceDir { .. })));
    }

    #[test]
    fn test_organize_moves_by_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("report.PDF"), "pdf").expect("write file");
        fs::write(base.join("README"), "readme").expect("write file");

        let organizer = extension_organizer(base);
        let mut events = Vec::new();
        let report = organizer
            .organize(false, |outcome| events.push(outcome.clone()))
            .expect("organize");

        assert_eq!(report.moved, 2);
        assert_eq!(report.failed, 0);
        assert!(base.join("PDF").join("report.PDF").exists());
        assert!(base.join("NO_EXTENSION").join("README").exists());
        assert!(events.iter().all(|e| matches!(e, FileOutcome::Moved { .. })));
    }

    #[test]
    fn test_preview_mutates_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("photo.jpg"), "jpg").expect("write file");

        let organizer = extension_organizer(base);
        let mut events = Vec::new();
        let report = organizer
            .organize(true, |outcome| events.push(outcome.clone()))
            .expect("preview");

        assert_eq!(report.previewed, 1);
        assert_eq!(report.moved, 0);
        assert!(base.join("photo.jpg").exists());
        assert!(!base.join("JPG").exists());
        assert!(!MoveLog::log_file_path(base).exists());
        assert_eq!(
            events,
            vec![FileOutcome::Previewed {
                name: "photo.jpg".to_string(),
                folder: "JPG".to_string(),
            }]
        );
    }

    #[test]
    fn test_log_file_is_never_organized() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(MoveLog::log_file_path(base), "stale log").expect("write log");
        fs::write(base.join("note.txt"), "note").expect("write file");

        let organizer = extension_organizer(base);
        let report = organizer.organize(false, |_| {}).expect("organize");

        assert_eq!(report.moved, 1);
        // The reserved log file stayed in place and was then overwritten by
        // the new run's log, not moved into a TXT folder.
        assert!(MoveLog::log_file_path(base).exists());
        assert!(!base.join("TXT").join("organizer_log.txt").exists());
    }

    #[test]
    fn test_organize_is_recursive() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("nested")).expect("mkdir");
        fs::write(base.join("nested").join("deep.pdf"), "pdf").expect("write file");

        let organizer = extension_organizer(base);
        let report = organizer.organize(false, |_| {}).expect("organize");

        assert_eq!(report.moved, 1);
        assert!(base.join("PDF").join("deep.pdf").exists());
        assert!(!base.join("nested").join("deep.pdf").exists());
    }

    #[test]
    fn test_collision_is_last_writer_wins() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("a")).expect("mkdir");
        fs::create_dir(base.join("b")).expect("mkdir");
        fs::write(base.join("a").join("dup.txt"), "first").expect("write file");
        fs::write(base.join("b").join("dup.txt"), "second").expect("write file");

        let organizer = extension_organizer(base);
        let report = organizer.organize(false, |_| {}).expect("organize");

        // Both moves succeed; the second replaces the first at the
        // destination. This is the documented lossy overwrite policy.
        assert_eq!(report.moved, 2);
        let survivor = fs::read_to_string(base.join("TXT").join("dup.txt")).expect("read");
        assert!(survivor == "first" || survivor == "second");
        assert!(!base.join("a").join("dup.txt").exists());
        assert!(!base.join("b").join("dup.txt").exists());
    }

    #[test]
    fn test_second_run_replaces_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("one.txt"), "1").expect("write file");

        let organizer = extension_organizer(base);
        organizer.organize(false, |_| {}).expect("first run");
        let first_log = fs::read_to_string(MoveLog::log_file_path(base)).expect("read log");

        fs::write(base.join("two.md"), "2").expect("write file");
        organizer.organize(false, |_| {}).expect("second run");
        let second_log = fs::read_to_string(MoveLog::log_file_path(base)).expect("read log");

        // The prior log is overwritten wholesale, not merged: the original
        // one.txt move record is gone (the second run records only a
        // self-move of the already-organized file).
        assert_ne!(first_log, second_log);
        assert!(second_log.contains("two.md"));
        assert!(!second_log.contains(first_log.trim()));
    }
}
