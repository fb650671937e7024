//! Cheap file-level conflict check.
//!
//! Looks for a line that begins with the start marker without running the
//! full scanner. A file the probe reports as clean always scans to an empty
//! chunk list; a file it reports as conflicted either scans to at least one
//! chunk or fails the scanner's structural checks.

use std::path::Path;
use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::debug;

use crate::conflict::registry::read_text;
use crate::errors::ChunkError;

fn start_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^<<<<<<<").expect("static start-marker regex"))
}

/// Stateless conflict probe.
pub struct ConflictProbe;

impl ConflictProbe {
    /// Does `content` contain a line starting with `<<<<<<<`?
    pub fn content_has_conflicts(content: &str) -> bool {
        start_marker_re().is_match(content)
    }

    /// Does the file at `path` contain conflict markers?
    ///
    /// Fails with [`ChunkError::NotFound`] when the file is missing.
    pub fn has_conflicts(path: &Path) -> Result<bool, ChunkError> {
        let content = read_text(path)?;
        let found = Self::content_has_conflicts(&content);
        debug!(path = %path.display(), found, "probed file for conflict markers");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::scanner::MarkerScanner;

    #[test]
    fn test_clean_content() {
        assert!(!ConflictProbe::content_has_conflicts("a\nb\n"));
        assert!(!ConflictProbe::content_has_conflicts(""));
    }

    #[test]
    fn test_marker_must_start_a_line() {
        assert!(!ConflictProbe::content_has_conflicts("let s = \"<<<<<<< HEAD\";\n"));
        assert!(ConflictProbe::content_has_conflicts("x\n<<<<<<< HEAD\n"));
        assert!(ConflictProbe::content_has_conflicts("x\r\n<<<<<<< HEAD\r\n"));
    }

    #[test]
    fn test_agrees_with_scanner() {
        let samples = [
            "plain text\n",
            "<<<<<<< A\nx\n=======\ny\n>>>>>>> B\n",
            "=======\n>>>>>>>\n",
            "  <<<<<<< indented is not a marker\n",
            "a\n<<<<<<<\n=======\n>>>>>>>",
        ];
        for sample in samples {
            let scanned = MarkerScanner::scan(sample).unwrap();
            assert_eq!(
                ConflictProbe::content_has_conflicts(sample),
                !scanned.is_empty(),
                "probe and scanner disagree on {sample:?}"
            );
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConflictProbe::has_conflicts(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(ChunkError::NotFound(_))));
    }

    #[test]
    fn test_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.txt");
        std::fs::write(&path, "<<<<<<< A\nx\n=======\ny\n>>>>>>> B\n").unwrap();
        assert!(ConflictProbe::has_conflicts(&path).unwrap());
        std::fs::write(&path, "resolved\n").unwrap();
        assert!(!ConflictProbe::has_conflicts(&path).unwrap());
    }
}
