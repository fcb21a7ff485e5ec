//! TOML configuration: custom rules and exclusion filters.
//!
//! A configuration file supplies the extension → folder mapping used by the
//! custom sort mode and, optionally, rules for files the organizer should
//! leave in place entirely. Exclusion supports exact filenames, glob
//! patterns, extensions, and regexes. By default nothing is excluded —
//! hidden files are organized like any other file.
//!
//! # Configuration File Format
//!
//! ```toml
//! [rules]
//! jpg = "Images"
//! pdf = "Documents"
//!
//! [exclude]
//! filenames  = [".DS_Store", "Thumbs.db"]
//! patterns   = ["*.tmp"]
//! extensions = ["bak"]
//! regex      = []
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classifier::CustomRules;

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern { pattern: String, reason: String },
    /// A custom rule maps an extension to an unusable folder name.
    InvalidRule { extension: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidRule { extension, reason } => {
                write!(f, "Invalid rule for extension '{}': {}", extension, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Deserialized configuration for one organizer run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizerConfig {
    /// Extension → folder mapping for the custom sort mode.
    #[serde(default)]
    pub rules: HashMap<String, String>,

    /// Rules for files the organizer never touches.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl OrganizerConfig {
    /// Load configuration with fallback to defaults.
    ///
    /// Resolution order:
    /// 1. An explicitly provided path
    /// 2. `.shelve.toml` in the current directory
    /// 3. `~/.config/shelve/config.toml`
    /// 4. Built-in defaults (no rules, no excludes)
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".shelve.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("shelve")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the validated custom rule set from the `[rules]` table.
    pub fn custom_rules(&self) -> Result<CustomRules, ConfigError> {
        let mut rules = CustomRules::new();
        for (extension, folder) in &self.rules {
            rules
                .insert(extension, folder)
                .map_err(|e| ConfigError::InvalidRule {
                    extension: extension.clone(),
                    reason: e.to_string(),
                })?;
        }
        Ok(rules)
    }

    /// Compiles the `[exclude]` rules into efficient matchers.
    pub fn compile_excludes(&self) -> Result<CompiledExcludes, ConfigError> {
        CompiledExcludes::new(&self.exclude)
    }
}

/// Compiled, pre-validated exclusion matchers.
///
/// Patterns are compiled once up front so per-file matching never reparses
/// them. The default is allow-all.
pub struct CompiledExcludes {
    filenames: HashSet<String>,
    extensions: HashSet<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledExcludes {
    fn new(rules: &ExcludeRules) -> Result<Self, ConfigError> {
        let patterns = rules
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = rules
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            filenames: rules.filenames.iter().cloned().collect(),
            extensions: rules
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            patterns,
            regexes,
        })
    }

    /// Excludes nothing.
    pub fn allow_all() -> Self {
        Self {
            filenames: HashSet::new(),
            extensions: HashSet::new(),
            patterns: Vec::new(),
            regexes: Vec::new(),
        }
    }

    /// Whether a file should be organized (i.e., matches no exclude rule).
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path) || pattern.matches(&file_name))
        {
            return false;
        }

        if self.regexes.iter().any(|regex| regex.is_match(&file_name)) {
            return false;
        }

        true
    }
}

impl Default for CompiledExcludes {
    fn default() -> Self {
        Self::allow_all()
    }
}
