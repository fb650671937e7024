//! Directory-wide search for files that still carry conflict markers.
//!
//! The walk honours `.gitignore`, `.git/info/exclude` and the global git
//! excludes, so build output git ignores is never read. [`FilePolicy`]
//! globs and size limits apply on top.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::conflict::probe::ConflictProbe;
use crate::errors::ChunkError;
use crate::file_policy::FilePolicy;

/// Stateless directory walker.
pub struct ConflictFinder;

impl ConflictFinder {
    /// Find files under `root` whose content has a start-marker line.
    ///
    /// Returned paths are relative to `root` and sorted. Files the policy
    /// blocks, files git ignores, unreadable files and non-UTF-8 files are
    /// skipped.
    pub fn find(root: &Path, policy: &FilePolicy) -> Result<Vec<PathBuf>, ChunkError> {
        if root.as_os_str().is_empty() {
            return Err(ChunkError::EmptyPath);
        }
        if !root.exists() {
            return Err(ChunkError::NotFound(root.display().to_string()));
        }

        let mut found = Vec::new();
        if root.is_file() {
            if let Some(name) = root.file_name() {
                let name = PathBuf::from(name);
                if Self::file_has_conflicts(root) {
                    found.push(name);
                }
            }
            return Ok(found);
        }

        let filter_root = root.to_path_buf();
        let filter_policy = policy.clone();
        let walker = WalkBuilder::new(root)
            .hidden(policy.skip_hidden())
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                if entry.file_name() == ".git" {
                    return false;
                }
                let rel = relative(&filter_root, entry.path());
                let visit = filter_policy.should_visit(&rel);
                if !visit {
                    debug!(path = %rel, "skipping excluded entry");
                }
                visit
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let rel = relative(root, entry.path());
            let decision = policy.evaluate_path(root, &rel);
            if !decision.should_scan() {
                debug!(path = %rel, decision = decision.label(), "file skipped by policy");
                continue;
            }
            if Self::file_has_conflicts(entry.path()) {
                debug!(path = %rel, "conflict markers found");
                if let Ok(rel_path) = entry.path().strip_prefix(root) {
                    found.push(rel_path.to_path_buf());
                }
            }
        }

        found.sort();
        info!(root = %root.display(), count = found.len(), "conflict scan complete");
        Ok(found)
    }

    fn file_has_conflicts(path: &Path) -> bool {
        match ConflictProbe::has_conflicts(path) {
            Ok(found) => found,
            Err(ChunkError::NotText(_)) => false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                false
            }
        }
    }
}

/// `path` relative to `root`, forward-slash separated.
fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
