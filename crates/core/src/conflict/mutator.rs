//! Chunk mutator: replace whole conflict regions in a file on disk.
//!
//! Every call re-reads and re-scans the file, splices the replacement text
//! over the target span (markers included), and writes the result through a
//! temporary file that is renamed over the original. Lines outside the span
//! are copied byte for byte, terminators included.
//!
//! # Ordering
//!
//! Replacing chunk `k` leaves chunks `0..k` untouched but renumbers every
//! chunk after it, because the replaced region no longer scans as a chunk.
//! Callers replacing several chunks of one file with separate calls must go
//! from the highest ID down to 0, or pass the chunk's fingerprint so a shifted
//! ID is rejected instead of silently hitting the wrong region.
//! [`ChunkMutator::replace_many`] avoids the problem by splicing every edit
//! from a single scan.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::registry::read_text;
use crate::conflict::scanner::{ConflictChunk, LineSeparator, MarkerScanner, ScannedDocument};
use crate::errors::ChunkError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Line separator used between replacement lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingPolicy {
    /// Use the separator the file already uses.
    #[default]
    Preserve,
    Lf,
    Crlf,
}

impl LineEndingPolicy {
    fn separator(self, detected: LineSeparator) -> &'static str {
        match self {
            Self::Preserve => detected.as_str(),
            Self::Lf => LineSeparator::Lf.as_str(),
            Self::Crlf => LineSeparator::CrLf.as_str(),
        }
    }
}

impl std::fmt::Display for LineEndingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Preserve => write!(f, "preserve"),
            Self::Lf => write!(f, "lf"),
            Self::Crlf => write!(f, "crlf"),
        }
    }
}

/// One requested chunk replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkEdit {
    pub id: usize,
    pub content: String,
    /// When set, the chunk must still have this fingerprint.
    #[serde(default)]
    pub fingerprint: Option<String>,
}

impl ChunkEdit {
    pub fn new(id: usize, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }
}

/// Split replacement text into lines.
///
/// An empty string is zero lines. Otherwise one trailing line break is
/// dropped and the rest is split at `\n`, with any `\r` before it removed.
pub fn replacement_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    let body = match content.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => content,
    };
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

// ---------------------------------------------------------------------------
// Mutator
// ---------------------------------------------------------------------------

/// Rewrites conflict chunks in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkMutator {
    line_endings: LineEndingPolicy,
}

impl ChunkMutator {
    pub fn new(line_endings: LineEndingPolicy) -> Self {
        Self { line_endings }
    }

    /// Replace chunk `id` of the file at `path` with `new_content`.
    ///
    /// The chunk list is re-derived from the current file bytes. IDs outside
    /// the list fail with [`ChunkError::ChunkNotFound`] and leave the file
    /// untouched.
    pub fn replace_chunk(&self, path: &Path, id: usize, new_content: &str) -> Result<(), ChunkError> {
        self.replace_many(path, &[ChunkEdit::new(id, new_content)])
    }

    /// Like [`replace_chunk`](Self::replace_chunk), but refuse with
    /// [`ChunkError::StaleChunk`] unless chunk `id` still has `fingerprint`.
    pub fn replace_chunk_checked(
        &self,
        path: &Path,
        id: usize,
        new_content: &str,
        fingerprint: &str,
    ) -> Result<(), ChunkError> {
        self.replace_many(
            path,
            &[ChunkEdit::new(id, new_content).with_fingerprint(fingerprint)],
        )
    }

    /// Apply several edits computed from one scan, in one write.
    ///
    /// Every edit is validated before anything is written: IDs must be
    /// distinct and in range, and fingerprints, when given, must match.
    pub fn replace_many(&self, path: &Path, edits: &[ChunkEdit]) -> Result<(), ChunkError> {
        let content = read_text(path)?;
        let doc = MarkerScanner::scan_document(&content).map_err(|source| ChunkError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let planned = plan_edits(&doc, edits)?;
        let updated = self.splice(&doc, &planned);

        write_atomic(path, &updated)?;

        for (chunk, _) in &planned {
            info!(
                path = %path.display(),
                chunk_id = chunk.id,
                start_line = chunk.start_line,
                end_line = chunk.end_line,
                "replaced conflict chunk"
            );
        }
        Ok(())
    }

    /// Rebuild the document with each planned chunk span replaced.
    ///
    /// `planned` must be sorted by ascending start line.
    pub fn splice(&self, doc: &ScannedDocument<'_>, planned: &[(&ConflictChunk, &str)]) -> String {
        let sep = self.line_endings.separator(doc.separator);
        let mut out = String::new();
        let mut cursor = 0;

        for (chunk, replacement) in planned {
            let start = chunk.start_line - 1;
            let end = chunk.end_line - 1;

            for line in &doc.lines[cursor..start] {
                out.push_str(line.text);
                out.push_str(line.terminator);
            }

            let lines = replacement_lines(replacement);
            let last_terminator = doc.lines[end].terminator;
            for (i, line) in lines.iter().enumerate() {
                out.push_str(line);
                if i + 1 < lines.len() {
                    out.push_str(sep);
                } else {
                    out.push_str(last_terminator);
                }
            }

            debug!(
                chunk_id = chunk.id,
                old_lines = chunk.line_count(),
                new_lines = lines.len(),
                "spliced chunk"
            );
            cursor = end + 1;
        }

        for line in &doc.lines[cursor..] {
            out.push_str(line.text);
            out.push_str(line.terminator);
        }
        out
    }
}

/// Validate `edits` against the scanned chunks and order them top to bottom.
fn plan_edits<'d, 'e>(
    doc: &'d ScannedDocument<'_>,
    edits: &'e [ChunkEdit],
) -> Result<Vec<(&'d ConflictChunk, &'e str)>, ChunkError> {
    let count = doc.chunks.len();
    let mut seen = HashSet::new();
    let mut planned = Vec::with_capacity(edits.len());

    for edit in edits {
        if !seen.insert(edit.id) {
            return Err(ChunkError::DuplicateEdit(edit.id));
        }
        let chunk = doc
            .chunks
            .get(edit.id)
            .ok_or(ChunkError::ChunkNotFound { id: edit.id, count })?;

        if let Some(expected) = &edit.fingerprint {
            let actual = chunk.fingerprint();
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(ChunkError::StaleChunk {
                    id: edit.id,
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        planned.push((chunk, edit.content.as_str()));
    }

    planned.sort_by_key(|(chunk, _)| chunk.start_line);
    Ok(planned)
}

/// Write `contents` to a temporary file next to `path` and rename it over
/// `path`, keeping the original permissions.
///
/// A symlinked `path` is resolved first so the link survives and its target
/// receives the new contents.
fn write_atomic(path: &Path, contents: &str) -> Result<(), ChunkError> {
    let write_err = |source: std::io::Error| ChunkError::Write {
        path: path.display().to_string(),
        source,
    };

    let target = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    if let Ok(meta) = std::fs::metadata(&target) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(write_err)?;
    }

    tmp.persist(&target).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_CHUNKS: &str = "\
top
<<<<<<< HEAD
a
=======
b
>>>>>>> feature
middle
<<<<<<< HEAD
c
=======
d
>>>>>>> feature
bottom
";

    fn file_with(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conflicted.txt");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_replacement_lines() {
        assert!(replacement_lines("").is_empty());
        assert_eq!(replacement_lines("x"), vec!["x"]);
        assert_eq!(replacement_lines("x\n"), vec!["x"]);
        assert_eq!(replacement_lines("x\r\ny\r\n"), vec!["x", "y"]);
        assert_eq!(replacement_lines("\n"), vec![""]);
        assert_eq!(replacement_lines("x\n\n"), vec!["x", ""]);
    }

    #[test]
    fn test_replace_single_chunk() {
        let (_dir, path) = file_with(TWO_CHUNKS);
        ChunkMutator::default()
            .replace_chunk(&path, 1, "c\nd")
            .unwrap();
        let after = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            after,
            "top\n<<<<<<< HEAD\na\n=======\nb\n>>>>>>> feature\nmiddle\nc\nd\nbottom\n"
        );
    }

    #[test]
    fn test_empty_replacement_deletes_span() {
        let (_dir, path) = file_with(TWO_CHUNKS);
        let mutator = ChunkMutator::default();
        mutator.replace_chunk(&path, 1, "").unwrap();
        mutator.replace_chunk(&path, 0, "").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "top\nmiddle\nbottom\n");
    }

    #[test]
    fn test_out_of_range_leaves_file_untouched() {
        let (_dir, path) = file_with(TWO_CHUNKS);
        let result = ChunkMutator::default().replace_chunk(&path, 2, "x");
        assert!(matches!(
            result,
            Err(ChunkError::ChunkNotFound { id: 2, count: 2 })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TWO_CHUNKS);
    }

    #[test]
    fn test_parse_error_leaves_file_untouched() {
        let broken = "<<<<<<< HEAD\na\n=======\nb\n";
        let (_dir, path) = file_with(broken);
        let result = ChunkMutator::default().replace_chunk(&path, 0, "x");
        assert!(matches!(result, Err(ChunkError::Parse { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), broken);
    }

    #[test]
    fn test_stale_fingerprint_rejected() {
        let (_dir, path) = file_with(TWO_CHUNKS);
        let chunks = MarkerScanner::scan(TWO_CHUNKS).unwrap();
        let fp_second = chunks[1].fingerprint();

        let result = ChunkMutator::default().replace_chunk_checked(&path, 0, "x", &fp_second);
        assert!(matches!(result, Err(ChunkError::StaleChunk { id: 0, .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TWO_CHUNKS);

        ChunkMutator::default()
            .replace_chunk_checked(&path, 1, "x", &fp_second)
            .unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("middle\nx\nbottom"));
    }

    #[test]
    fn test_replace_many_from_one_scan() {
        let (_dir, path) = file_with(TWO_CHUNKS);
        ChunkMutator::default()
            .replace_many(
                &path,
                &[
                    ChunkEdit::new(0, "a\nb\nextra"),
                    ChunkEdit::new(1, "cd"),
                ],
            )
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "top\na\nb\nextra\nmiddle\ncd\nbottom\n"
        );
    }

    #[test]
    fn test_replace_many_rejects_duplicates() {
        let (_dir, path) = file_with(TWO_CHUNKS);
        let result = ChunkMutator::default()
            .replace_many(&path, &[ChunkEdit::new(1, "x"), ChunkEdit::new(1, "y")]);
        assert!(matches!(result, Err(ChunkError::DuplicateEdit(1))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TWO_CHUNKS);
    }

    #[test]
    fn test_crlf_file_keeps_its_separator() {
        let content = "a\r\n<<<<<<< HEAD\r\nx\r\n=======\r\ny\r\n>>>>>>> b\r\nz\r\n";
        let (_dir, path) = file_with(content);
        ChunkMutator::default()
            .replace_chunk(&path, 0, "x\ny")
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\r\nx\r\ny\r\nz\r\n");
    }

    #[test]
    fn test_lf_policy_overrides_separator() {
        let content = "<<<<<<< HEAD\r\nx\r\n=======\r\ny\r\n>>>>>>> b\r\nz\r\n";
        let (_dir, path) = file_with(content);
        ChunkMutator::new(LineEndingPolicy::Lf)
            .replace_chunk(&path, 0, "x\ny")
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\ny\r\nz\r\n");
    }

    #[test]
    fn test_chunk_at_eof_without_newline() {
        let content = "a\n<<<<<<< HEAD\nx\n=======\ny\n>>>>>>> b";
        let (_dir, path) = file_with(content);
        ChunkMutator::default().replace_chunk(&path, 0, "merged").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nmerged");
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, path) = file_with(TWO_CHUNKS);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        ChunkMutator::default().replace_chunk(&path, 0, "x").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_write_failure_maps_to_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("plain.txt");
        std::fs::write(&not_a_dir, "original\n").unwrap();

        let result = write_atomic(&not_a_dir.join("child.txt"), "new\n");
        assert!(matches!(result, Err(ChunkError::Write { .. })));
        assert_eq!(std::fs::read_to_string(&not_a_dir).unwrap(), "original\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_directory_leaves_file_untouched() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, path) = file_with(TWO_CHUNKS);
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged runners ignore directory permissions.
        let writable = std::fs::write(dir.path().join("check"), "").is_ok();
        let result = ChunkMutator::default().replace_chunk(&path, 0, "x");
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            return;
        }

        assert!(matches!(result, Err(ChunkError::Write { .. })));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), TWO_CHUNKS);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_keeps_its_link() {
        let (dir, path) = file_with(TWO_CHUNKS);
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&path, &link).unwrap();

        ChunkMutator::default().replace_chunk(&link, 1, "x").unwrap();

        assert!(std::fs::symlink_metadata(&link)
            .unwrap()
            .file_type()
            .is_symlink());
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("middle\nx\nbottom\n"));
    }
}
