//! Named resolution shortcuts.
//!
//! The [`ConflictResolver`] turns a [`Resolution`] into replacement text for
//! a chunk and hands it to the [`ChunkMutator`].

use std::path::Path;

use tracing::info;

use crate::conflict::mutator::{ChunkEdit, ChunkMutator};
use crate::conflict::registry::ChunkRegistry;
use crate::conflict::scanner::ConflictChunk;
use crate::errors::ChunkError;

/// Named resolution strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Keep our side.
    Ours,
    /// Keep their side.
    Theirs,
    /// Keep ours followed by theirs.
    Both,
    /// Use caller-supplied merged content.
    Custom(String),
}

impl Resolution {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ours => "ours",
            Self::Theirs => "theirs",
            Self::Both => "both",
            Self::Custom(_) => "custom",
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ours" => Ok(Self::Ours),
            "theirs" => Ok(Self::Theirs),
            "both" => Ok(Self::Both),
            other => Err(format!(
                "invalid resolution '{}': use 'ours', 'theirs' or 'both'",
                other
            )),
        }
    }
}

/// Stateless resolution operations.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Text that replaces `chunk` under `resolution`.
    ///
    /// Kept sides are newline-terminated so that the mutator's trailing
    /// newline rule gives back exactly the side's lines, blank ones included.
    pub fn resolved_content(resolution: &Resolution, chunk: &ConflictChunk) -> String {
        let ours = side_text(&chunk.ours, chunk.ours_lines);
        let theirs = side_text(&chunk.theirs, chunk.theirs_lines);
        match resolution {
            Resolution::Ours => ours,
            Resolution::Theirs => theirs,
            Resolution::Both => ours + &theirs,
            Resolution::Custom(content) => content.clone(),
        }
    }

    /// Resolve chunk `id` of the file at `path`.
    ///
    /// An empty side resolves to zero lines, so `Ours` on a chunk whose ours
    /// side is empty removes the region entirely.
    pub fn resolve(
        mutator: &ChunkMutator,
        path: &Path,
        id: usize,
        resolution: &Resolution,
        fingerprint: Option<&str>,
    ) -> Result<(), ChunkError> {
        let chunk = ChunkRegistry::get_chunk(path, id)?;
        let content = Self::resolved_content(resolution, &chunk);
        info!(
            path = %path.display(),
            chunk_id = id,
            resolution = resolution.label(),
            "resolving conflict chunk"
        );

        // The write must hit the same region that was read.
        let pinned = fingerprint
            .map(str::to_string)
            .unwrap_or_else(|| chunk.fingerprint());
        mutator.replace_many(path, &[ChunkEdit::new(id, content).with_fingerprint(pinned)])
    }
}

/// A side as replacement text: zero lines stay empty, anything else gets a
/// terminating newline.
fn side_text(text: &str, lines: usize) -> String {
    if lines == 0 {
        String::new()
    } else {
        format!("{}\n", text)
    }
}
