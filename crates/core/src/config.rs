//! TOML-based configuration for gitsynth.
//!
//! Every section is optional; a missing file at the default location yields
//! [`AppConfig::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::mutator::LineEndingPolicy;
use crate::errors::ConfigError;

/// Levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chunk replacement settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Directory scan settings.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Chunk replacement configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Separator placed between replacement lines.
    #[serde(default)]
    pub line_endings: LineEndingPolicy,

    /// Refuse tool-driven edits that do not carry the chunk fingerprint.
    #[serde(default)]
    pub require_fingerprint: bool,
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Directory scan configuration used by `find_merge_conflicts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Glob patterns (relative paths) never scanned.
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Files larger than this many bytes are skipped. 0 = unlimited.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Skip files and directories whose name starts with `.`.
    #[serde(default = "default_true")]
    pub skip_hidden: bool,
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".git/**".into(),
        "target/**".into(),
        "node_modules/**".into(),
    ]
}
fn default_max_file_size() -> u64 {
    2 * 1024 * 1024
}
fn default_true() -> bool {
    true
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            max_file_size: default_max_file_size(),
            skip_hidden: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Default config location: `<config dir>/gitsynth/config.toml`.
    pub fn default_path(config_dir: Option<PathBuf>) -> Option<PathBuf> {
        config_dir.map(|dir| dir.join("gitsynth").join("config.toml"))
    }

    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Load from `path` if the file exists, otherwise return defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!(path = %path.display(), "no configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate that all fields are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".into(),
                detail: format!(
                    "'{}' is not one of {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            });
        }
        if self.scan.ignore_patterns.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: "scan.ignore_patterns".into(),
                detail: "ignore patterns must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Commented default configuration written by `gitsynth init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# gitsynth configuration

[engine]
# Separator between replacement lines: preserve | lf | crlf
line_endings = "preserve"
# Refuse edit_file_chunk calls without the fingerprint from see_file_chunks
require_fingerprint = false

[scan]
ignore_patterns = [".git/**", "target/**", "node_modules/**"]
# Bytes; 0 = unlimited
max_file_size = 2097152
skip_hidden = true

[logging]
level = "warn"
"#;
