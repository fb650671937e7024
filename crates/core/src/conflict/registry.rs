//! Chunk registry: read access to the conflict chunks of a file on disk.
//!
//! The registry is derived data. Every call re-reads and re-scans the file,
//! so chunk IDs it returns are only valid until the next write.

use std::path::Path;

use tracing::{debug, info};

use crate::conflict::probe::ConflictProbe;
use crate::conflict::scanner::{ConflictChunk, MarkerScanner};
use crate::errors::ChunkError;

/// Read `path` as UTF-8 text, mapping failures onto [`ChunkError`].
pub(crate) fn read_text(path: &Path) -> Result<String, ChunkError> {
    if path.as_os_str().is_empty() {
        return Err(ChunkError::EmptyPath);
    }
    if !path.exists() {
        return Err(ChunkError::NotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path).map_err(|source| ChunkError::Read {
        path: path.display().to_string(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| ChunkError::NotText(path.display().to_string()))
}

/// Stateless chunk registry.
pub struct ChunkRegistry;

impl ChunkRegistry {
    /// List the conflict chunks of the file at `path`.
    ///
    /// Fails with [`ChunkError::NoConflicts`] when the probe finds no start
    /// marker, which callers can tell apart from [`ChunkError::Parse`].
    pub fn list_chunks(path: &Path) -> Result<Vec<ConflictChunk>, ChunkError> {
        let content = read_text(path)?;
        Self::chunks_in(path, &content)
    }

    /// Scan already-read `content` that belongs to `path`.
    pub fn chunks_in(path: &Path, content: &str) -> Result<Vec<ConflictChunk>, ChunkError> {
        if !ConflictProbe::content_has_conflicts(content) {
            debug!(path = %path.display(), "no conflict markers");
            return Err(ChunkError::NoConflicts(path.display().to_string()));
        }

        let chunks = MarkerScanner::scan(content).map_err(|source| ChunkError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        info!(path = %path.display(), count = chunks.len(), "listed conflict chunks");
        Ok(chunks)
    }

    /// Fetch one chunk by ID from a fresh scan.
    pub fn get_chunk(path: &Path, id: usize) -> Result<ConflictChunk, ChunkError> {
        let chunks = Self::list_chunks(path)?;
        let count = chunks.len();
        chunks
            .into_iter()
            .nth(id)
            .ok_or(ChunkError::ChunkNotFound { id, count })
    }

    /// Does chunk `id` exist in the current file content?
    pub fn contains(path: &Path, id: usize) -> Result<bool, ChunkError> {
        match Self::list_chunks(path) {
            Ok(chunks) => Ok(id < chunks.len()),
            Err(ChunkError::NoConflicts(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
