//! shelve - organize files into rule-based subdirectories
//!
//! This library classifies the files under a directory (by content category,
//! extension, modification date, or custom extension rules), moves them into
//! matching subfolders while recording every move in a persisted log, and can
//! revert the most recent run by replaying that log in reverse. Preview mode
//! reports intended moves without mutating the file system.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod move_log;
pub mod organizer;
pub mod output;
pub mod undo;

pub use classifier::{Classifier, CustomRules, SortMode};
pub use config::{CompiledExcludes, ConfigError, OrganizerConfig};
pub use move_log::{MoveLog, MoveRecord};
pub use organizer::{FileOutcome, OrganizeError, OrganizeReport, OrganizeResult, Organizer};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Cli, run};
