//! Classification of files into destination folder names.
//!
//! The classifier is the pure core of the organizer: given a file path and a
//! sort mode it decides which subdirectory the file belongs in. The only I/O
//! it performs is reading file metadata (for date mode) and sniffing a bounded
//! prefix of file content (for content-category mode).

use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, Local};

/// Folder used when the content probe cannot determine a category.
pub const UNKNOWN_CATEGORY: &str = "UNKNOWN";
/// Folder used for files without a usable extension.
pub const NO_EXTENSION: &str = "NO_EXTENSION";
/// Folder used when no custom rule matches a file's extension.
pub const UNMATCHED_RULE: &str = "OTHER";
/// Defensive sentinel for classification results that would be unsafe as
/// directory names (empty, or containing a path separator).
pub const UNCATEGORIZED: &str = "UNCATEGORIZED";

/// The classification strategy selected for a run. Chosen once, immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Group by content category sniffed from file content ("IMAGE", "TEXT", ...).
    ContentCategory,
    /// Group by upper-cased file extension ("PDF", "NO_EXTENSION", ...).
    Extension,
    /// Group by last-modified date, "YYYY-MM-DD" in local time.
    ModifiedDate,
    /// Group by a user-supplied extension → folder mapping.
    Custom,
}

/// Errors raised when building a custom rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The folder name for an extension is empty.
    EmptyFolderName { extension: String },
    /// The folder name contains a path separator and would escape the
    /// source directory.
    FolderNameHasSeparator { extension: String, folder: String },
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFolderName { extension } => {
                write!(f, "rule for extension '{}' maps to an empty folder name", extension)
            }
            Self::FolderNameHasSeparator { extension, folder } => {
                write!(
                    f,
                    "rule for extension '{}' maps to '{}', which contains a path separator",
                    extension, folder
                )
            }
        }
    }
}

impl std::error::Error for RuleError {}

/// User-supplied mapping from lowercase extension (no leading dot) to a
/// destination folder name. Folder names are validated on insertion so that
/// classification itself never produces an unsafe directory name.
#[derive(Debug, Clone, Default)]
pub struct CustomRules {
    map: HashMap<String, String>,
}

impl CustomRules {
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Adds a rule. The extension key is lower-cased; the folder name must be
    /// non-empty and free of path separators.
    pub fn insert(&mut self, extension: &str, folder: &str) -> Result<(), RuleError> {
        let extension = extension.trim().trim_start_matches('.').to_lowercase();
        let folder = folder.trim();
        if folder.is_empty() {
            return Err(RuleError::EmptyFolderName { extension });
        }
        if folder.contains(['/', '\\']) {
            return Err(RuleError::FolderNameHasSeparator {
                extension,
                folder: folder.to_string(),
            });
        }
        self.map.insert(extension, folder.to_string());
        Ok(())
    }

    /// Looks up the folder for a lowercase extension key.
    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.map.get(extension).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Decides the destination folder name for each file in a run.
#[derive(Debug, Clone)]
pub struct Classifier {
    mode: SortMode,
    rules: CustomRules,
    probe: ContentProbe,
}

impl Classifier {
    pub fn new(mode: SortMode, rules: CustomRules) -> Self {
        Self {
            mode,
            rules,
            probe: ContentProbe::new(),
        }
    }

    pub fn mode(&self) -> SortMode {
        self.mode
    }

    /// Returns the folder name the given file belongs in.
    ///
    /// Only `ModifiedDate` mode can fail, when the file's metadata cannot be
    /// read. The content probe is best-effort and degrades to "UNKNOWN"
    /// rather than erroring. Any computed name that would be unsafe as a
    /// single directory component degrades to "UNCATEGORIZED".
    pub fn folder_for(&self, path: &Path) -> io::Result<String> {
        let folder = match self.mode {
            SortMode::ContentCategory => self.probe.category_of(path),
            SortMode::Extension => extension_label(path),
            SortMode::ModifiedDate => modified_date_label(path)?,
            SortMode::Custom => {
                let ext = extension_label(path).to_lowercase();
                self.rules
                    .lookup(&ext)
                    .unwrap_or(UNMATCHED_RULE)
                    .to_string()
            }
        };
        Ok(sanitize_folder_name(folder))
    }
}

/// Upper-cased extension label for a file name.
///
/// A name with no dot, a leading dot only (".gitignore"), or a trailing dot
/// ("README.") has no usable extension and maps to "NO_EXTENSION".
pub fn extension_label(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < name.len() => name[dot + 1..].to_uppercase(),
        _ => NO_EXTENSION.to_string(),
    }
}

/// Local-time "YYYY-MM-DD" label from the file's last-modified timestamp.
fn modified_date_label(path: &Path) -> io::Result<String> {
    let modified = fs::metadata(path)?.modified()?;
    let local: DateTime<Local> = modified.into();
    Ok(local.format("%Y-%m-%d").to_string())
}

/// Guards against classification results that cannot be used as a single
/// directory component under the source directory.
fn sanitize_folder_name(folder: String) -> String {
    if folder.is_empty() || folder.contains(['/', '\\']) {
        UNCATEGORIZED.to_string()
    } else {
        folder
    }
}

/// Best-effort content-category detection.
///
/// Magic-byte sniffing (via `infer`) covers binary formats; a small extension
/// heuristic covers text-like formats that carry no magic bytes. A file that
/// matches neither is "UNKNOWN" — never an error.
#[derive(Debug, Clone)]
pub struct ContentProbe {
    extension_fallback: HashMap<&'static str, &'static str>,
}

/// How many leading bytes to read when sniffing magic numbers.
const SNIFF_PREFIX_LEN: usize = 8192;

impl ContentProbe {
    pub fn new() -> Self {
        let mut extension_fallback = HashMap::new();
        for ext in ["txt", "md", "csv", "log", "html", "htm", "xml", "json", "yaml", "yml", "toml", "ini"] {
            extension_fallback.insert(ext, "TEXT");
        }
        extension_fallback.insert("svg", "IMAGE");
        Self { extension_fallback }
    }

    /// Upper-cased primary MIME component for a file ("image/png" → "IMAGE"),
    /// or "UNKNOWN" when nothing can be determined.
    pub fn category_of(&self, path: &Path) -> String {
        if let Some(mime) = self.sniff_mime(path)
            && let Some((primary, _)) = mime.split_once('/')
        {
            return primary.to_uppercase();
        }

        let ext = extension_label(path);
        if ext != NO_EXTENSION
            && let Some(category) = self.extension_fallback.get(ext.to_lowercase().as_str())
        {
            return (*category).to_string();
        }

        UNKNOWN_CATEGORY.to_string()
    }

    /// Sniffs the MIME type from the file's leading bytes. Read failures are
    /// treated as "no signal".
    fn sniff_mime(&self, path: &Path) -> Option<String> {
        let mut file = fs::File::open(path).ok()?;
        let mut buf = [0u8; SNIFF_PREFIX_LEN];
        let read = file.read(&mut buf).ok()?;
        infer::get(&buf[..read]).map(|kind| kind.mime_type().to_string())
    }
}

impl Default for ContentProbe {
    fn default() -> Self {
        Self::new()
    }
}
