//! File-policy enforcement for directory conflict scans.
//!
//! Provides [`FilePolicy`] which encapsulates `max_file_size`,
//! `ignore_patterns` and `skip_hidden` from [`ScanConfig`] and evaluates
//! candidate files before the finder reads them. `.gitignore` rules are
//! applied by the finder's walker on top of this policy.
//!
//! # Decision model
//!
//! | Condition | Decision |
//! |-----------|----------|
//! | Path matches an ignore pattern | `Ignored` |
//! | Size exceeds `max_file_size` (when > 0) | `Oversize` |
//! | None of the above | `Allow` |

use std::path::Path;

use tracing::debug;

use crate::config::ScanConfig;

// ---------------------------------------------------------------------------
// Decision enum
// ---------------------------------------------------------------------------

/// The outcome of evaluating a file against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePolicyDecision {
    /// File passes all checks; scan it.
    Allow,
    /// File matches an ignore pattern.
    Ignored { pattern: String },
    /// File exceeds the configured `max_file_size`.
    Oversize { size: u64, limit: u64 },
}

impl FilePolicyDecision {
    /// `true` if the file should be scanned.
    pub fn should_scan(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Short human-readable label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Ignored { .. } => "ignored",
            Self::Oversize { .. } => "oversize",
        }
    }
}

// ---------------------------------------------------------------------------
// FilePolicy
// ---------------------------------------------------------------------------

/// Evaluates candidate files against size limits and ignore patterns.
#[derive(Debug, Clone, Default)]
pub struct FilePolicy {
    /// Maximum allowed file size in bytes. 0 = no limit.
    max_file_size: u64,
    /// Glob patterns to exclude. Matched against the *relative* path.
    ignore_patterns: Vec<String>,
    /// Skip entries whose name starts with `.`.
    skip_hidden: bool,
}

impl FilePolicy {
    pub fn new(max_file_size: u64, ignore_patterns: Vec<String>, skip_hidden: bool) -> Self {
        Self {
            max_file_size,
            ignore_patterns,
            skip_hidden,
        }
    }

    /// Evaluate a file.
    ///
    /// `rel_path` is the file's path relative to the scan root (forward-slash
    /// separated). `size` is the file size in bytes.
    pub fn evaluate(&self, rel_path: &str, size: u64) -> FilePolicyDecision {
        if let Some(pattern) = self.matching_pattern(rel_path) {
            debug!(path = rel_path, pattern, "file matches ignore pattern");
            return FilePolicyDecision::Ignored {
                pattern: pattern.to_string(),
            };
        }

        if self.max_file_size > 0 && size > self.max_file_size {
            debug!(
                path = rel_path,
                size,
                limit = self.max_file_size,
                "file exceeds max_file_size, skipping"
            );
            return FilePolicyDecision::Oversize {
                size,
                limit: self.max_file_size,
            };
        }

        FilePolicyDecision::Allow
    }

    /// Should the walker descend into / look at the entry at relative path
    /// `rel_path`? Hidden entries are left to the walker.
    pub fn should_visit(&self, rel_path: &str) -> bool {
        self.matching_pattern(rel_path).is_none()
    }

    /// Evaluate a file on disk (reads metadata for size).
    pub fn evaluate_path(&self, base_dir: &Path, rel_path: &str) -> FilePolicyDecision {
        let size = match std::fs::metadata(base_dir.join(rel_path)) {
            Ok(m) => m.len(),
            Err(_) => return FilePolicyDecision::Allow,
        };
        self.evaluate(rel_path, size)
    }

    /// Whether the walker should skip dot-files and dot-directories.
    pub fn skip_hidden(&self) -> bool {
        self.skip_hidden
    }

    /// Test `rel_path` against each ignore glob; a directory pattern like
    /// `target/**` also matches the bare directory `target`.
    fn matching_pattern(&self, rel_path: &str) -> Option<&str> {
        let path = rel_path.replace('\\', "/");
        self.ignore_patterns
            .iter()
            .map(String::as_str)
            .find(|pattern| {
                let pat = pattern.replace('\\', "/");
                glob_match::glob_match(&pat, &path)
                    || pat
                        .strip_suffix("/**")
                        .is_some_and(|dir| glob_match::glob_match(dir, &path))
            })
    }
}

impl From<&ScanConfig> for FilePolicy {
    fn from(scan: &ScanConfig) -> Self {
        Self::new(
            scan.max_file_size,
            scan.ignore_patterns.clone(),
            scan.skip_hidden,
        )
    }
}
