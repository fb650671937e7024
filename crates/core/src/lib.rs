//! gitsynth core library.
//!
//! Parses Git conflict markers into addressable chunks and rewrites them one
//! at a time without disturbing the rest of the file. The engine is a pure
//! file-in/file-out component: the decision about *what* each chunk should
//! become belongs to the caller, which drives it through the [`tools`] layer
//! or the CLI.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod file_policy;
pub mod tools;

// Re-exports for convenience.
pub use config::AppConfig;
pub use conflict::{ChunkMutator, ChunkRegistry, ConflictChunk, ConflictProbe, MarkerScanner};
pub use tools::{ToolContext, ToolRegistry};
