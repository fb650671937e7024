//! Error types for the gitsynth core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. Tool
//! errors wrap engine errors so a tool failure keeps the engine's message.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Marker parse errors
// ---------------------------------------------------------------------------

/// Structural problems found while scanning conflict markers.
///
/// Line numbers are 1-indexed and refer to the scanned content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A start marker appeared inside an already-open conflict region.
    #[error("nested conflict marker at line {line} (region opened at line {open_line}); conflict markers do not nest")]
    NestedConflict { line: usize, open_line: usize },

    /// Input ended while a conflict region was still open.
    #[error("unterminated conflict region starting at line {start_line}")]
    UnterminatedConflict { start_line: usize },

    /// An end marker closed a region that never saw a divider.
    #[error("conflict region starting at line {start_line} ends at line {line} without a '=======' divider")]
    MissingDivider { start_line: usize, line: usize },

    /// A second divider appeared inside one region.
    #[error("duplicate '=======' divider at line {line} in conflict region starting at line {start_line}")]
    DuplicateDivider { start_line: usize, line: usize },
}

// ---------------------------------------------------------------------------
// Chunk engine errors
// ---------------------------------------------------------------------------

/// Errors from the probe, registry and mutator.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// The caller supplied an empty path.
    #[error("file path cannot be empty")]
    EmptyPath,

    /// The file does not exist.
    #[error("file {0} does not exist")]
    NotFound(String),

    /// The probe found no conflict markers in the file.
    #[error("no merge conflicts found in file: {0}")]
    NoConflicts(String),

    /// The file's markers are malformed.
    #[error("failed to parse conflict chunks in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    /// The requested chunk ID is outside `[0, count)`.
    #[error("chunk_id {id} out of range, file has {count} chunks")]
    ChunkNotFound { id: usize, count: usize },

    /// The chunk at `id` no longer matches the fingerprint the caller saw.
    #[error("chunk {id} has changed since it was read (expected fingerprint {expected}, found {actual}); list the chunks again")]
    StaleChunk {
        id: usize,
        expected: String,
        actual: String,
    },

    /// A batch named the same chunk more than once.
    #[error("chunk {0} appears more than once in the edit batch")]
    DuplicateEdit(usize),

    /// The file is not valid UTF-8 text.
    #[error("file {0} is not valid UTF-8 text")]
    NotText(String),

    /// Reading the file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing the file back failed. The original content is left in place.
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Tool adapter errors
// ---------------------------------------------------------------------------

/// Errors raised by the tool adapter layer.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Arguments failed validation before any file access.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No tool is registered under this name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Edits must carry the fingerprint reported by `see_file_chunks`.
    #[error("a fingerprint from see_file_chunks is required to edit a chunk")]
    FingerprintRequired,

    /// The engine rejected the operation.
    #[error(transparent)]
    Engine(#[from] ChunkError),
}
