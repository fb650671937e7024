//! Conflict-chunk extraction and in-place rewriting.
//!
//! The conflict subsystem is responsible for:
//! 1. **Scanning** -- turning `<<<<<<<` / `=======` / `>>>>>>>` regions into
//!    addressable [`ConflictChunk`]s.
//! 2. **Probing** -- a cheap "does this file still have markers" check.
//! 3. **Listing** -- re-deriving the chunk list from the current file bytes.
//! 4. **Mutating** -- replacing one or more chunk spans and writing the file
//!    back atomically.
//!
//! Chunk IDs are positional and recomputed on every scan. After a write only
//! chunks with a smaller ID than the replaced one keep their ID, so separate
//! replacements in one file go from the highest ID down.

pub mod finder;
pub mod mutator;
pub mod probe;
pub mod registry;
pub mod resolution;
pub mod scanner;

pub use finder::ConflictFinder;
pub use mutator::{ChunkEdit, ChunkMutator, LineEndingPolicy};
pub use probe::ConflictProbe;
pub use registry::ChunkRegistry;
pub use resolution::{ConflictResolver, Resolution};
pub use scanner::{ConflictChunk, LineSeparator, MarkerScanner};
