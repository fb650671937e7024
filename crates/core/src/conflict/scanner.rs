//! Conflict-marker scanner.
//!
//! Splits file text into lines and runs a small state machine over them to
//! find `<<<<<<<` / `=======` / `>>>>>>>` regions. Markers are recognised by
//! prefix only; any label after the prefix is kept separately and never ends
//! up in the captured sides.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::ParseError;

/// Prefix of the line that opens a conflict region.
pub const START_MARKER: &str = "<<<<<<<";
/// Prefix of the diff3 base-section line (`merge.conflictStyle=diff3`).
pub const BASE_MARKER: &str = "|||||||";
/// Prefix of the line separating ours from theirs.
pub const DIVIDER_MARKER: &str = "=======";
/// Prefix of the line that closes a conflict region.
pub const END_MARKER: &str = ">>>>>>>";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One addressable conflict region in a scanned file version.
///
/// IDs and line numbers are only valid against the exact content that
/// produced them; any write to the file invalidates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictChunk {
    /// Zero-based position of the region, top of file first.
    pub id: usize,
    /// Text between the start marker and the divider (or base marker).
    pub ours: String,
    /// Text between the divider and the end marker.
    pub theirs: String,
    /// Number of lines on our side. Tells a single blank line apart from an
    /// empty side, which both join to `""`.
    #[serde(default)]
    pub ours_lines: usize,
    /// Number of lines on their side.
    #[serde(default)]
    pub theirs_lines: usize,
    /// Common-ancestor text from a diff3-style `|||||||` section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    /// Label after `<<<<<<<`, e.g. `HEAD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ours_label: Option<String>,
    /// Label after `>>>>>>>`, e.g. the incoming branch name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theirs_label: Option<String>,
    /// 1-indexed line of the start marker.
    pub start_line: usize,
    /// 1-indexed line of the end marker (inclusive).
    pub end_line: usize,
}

impl ConflictChunk {
    /// Short content hash used to detect that a chunk ID now points at a
    /// different region than the caller last saw.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.ours.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.theirs.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.base.as_deref().unwrap_or("").as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..16].to_string()
    }

    /// Number of file lines the region spans, markers included.
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// The line separator a file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparator {
    Lf,
    CrLf,
}

impl LineSeparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// The terminator of the first terminated line, `Lf` when there is none.
    pub fn detect(content: &str) -> Self {
        match content.find('\n') {
            Some(idx) if idx > 0 && content.as_bytes()[idx - 1] == b'\r' => Self::CrLf,
            _ => Self::Lf,
        }
    }
}

impl std::fmt::Display for LineSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lf => write!(f, "lf"),
            Self::CrLf => write!(f, "crlf"),
        }
    }
}

/// A line of the scanned content, split from its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Line text without the terminator.
    pub text: &'a str,
    /// `"\n"`, `"\r\n"`, or `""` for a final unterminated line.
    pub terminator: &'a str,
}

/// Split `content` into lines, keeping each line's own terminator so that
/// untouched lines can be written back byte for byte.
pub fn split_lines(content: &str) -> Vec<Line<'_>> {
    content
        .split_inclusive('\n')
        .map(|raw| {
            if let Some(text) = raw.strip_suffix("\r\n") {
                Line {
                    text,
                    terminator: &raw[text.len()..],
                }
            } else if let Some(text) = raw.strip_suffix('\n') {
                Line {
                    text,
                    terminator: &raw[text.len()..],
                }
            } else {
                Line {
                    text: raw,
                    terminator: "",
                }
            }
        })
        .collect()
}

/// Scanned content: its lines, separator and conflict regions.
#[derive(Debug, Clone)]
pub struct ScannedDocument<'a> {
    pub lines: Vec<Line<'a>>,
    pub separator: LineSeparator,
    pub chunks: Vec<ConflictChunk>,
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Ours,
    Base,
    Theirs,
}

/// A region that has seen its start marker but not yet its end marker.
struct OpenRegion<'a> {
    start_line: usize,
    ours_label: Option<String>,
    side: Side,
    ours: Vec<&'a str>,
    base: Option<Vec<&'a str>>,
    theirs: Vec<&'a str>,
}

impl<'a> OpenRegion<'a> {
    fn push(&mut self, text: &'a str) {
        match self.side {
            Side::Ours => self.ours.push(text),
            Side::Base => self.base.get_or_insert_with(Vec::new).push(text),
            Side::Theirs => self.theirs.push(text),
        }
    }
}

/// Stateless conflict-marker scanner.
pub struct MarkerScanner;

impl MarkerScanner {
    /// Scan `content` into an ordered list of conflict chunks.
    ///
    /// Returns an empty list for content with no markers.
    pub fn scan(content: &str) -> Result<Vec<ConflictChunk>, ParseError> {
        Self::scan_document(content).map(|doc| doc.chunks)
    }

    /// Scan `content`, keeping the split lines for callers that rewrite it.
    pub fn scan_document(content: &str) -> Result<ScannedDocument<'_>, ParseError> {
        let lines = split_lines(content);
        let separator = LineSeparator::detect(content);
        let sep = separator.as_str();

        let mut chunks: Vec<ConflictChunk> = Vec::new();
        let mut open: Option<OpenRegion<'_>> = None;

        for (idx, line) in lines.iter().enumerate() {
            let line_no = idx + 1;
            let text = line.text;

            if open.is_none() {
                if let Some(label) = text.strip_prefix(START_MARKER) {
                    open = Some(OpenRegion {
                        start_line: line_no,
                        ours_label: marker_label(label),
                        side: Side::Ours,
                        ours: Vec::new(),
                        base: None,
                        theirs: Vec::new(),
                    });
                }
                continue;
            }
            let Some(region) = open.as_mut() else {
                continue;
            };

            if text.starts_with(START_MARKER) {
                return Err(ParseError::NestedConflict {
                    line: line_no,
                    open_line: region.start_line,
                });
            }

            if region.side == Side::Ours && text.starts_with(BASE_MARKER) {
                region.side = Side::Base;
                region.base.get_or_insert_with(Vec::new);
                continue;
            }

            if text.starts_with(DIVIDER_MARKER) {
                if region.side == Side::Theirs {
                    return Err(ParseError::DuplicateDivider {
                        start_line: region.start_line,
                        line: line_no,
                    });
                }
                region.side = Side::Theirs;
                continue;
            }

            if let Some(label) = text.strip_prefix(END_MARKER) {
                if region.side != Side::Theirs {
                    return Err(ParseError::MissingDivider {
                        start_line: region.start_line,
                        line: line_no,
                    });
                }
                let Some(region) = open.take() else {
                    continue;
                };
                let chunk = ConflictChunk {
                    id: chunks.len(),
                    ours: region.ours.join(sep),
                    theirs: region.theirs.join(sep),
                    ours_lines: region.ours.len(),
                    theirs_lines: region.theirs.len(),
                    base: region.base.map(|b| b.join(sep)),
                    ours_label: region.ours_label,
                    theirs_label: marker_label(label),
                    start_line: region.start_line,
                    end_line: line_no,
                };
                debug!(
                    id = chunk.id,
                    start_line = chunk.start_line,
                    end_line = chunk.end_line,
                    "conflict region closed"
                );
                chunks.push(chunk);
                continue;
            }

            region.push(text);
        }

        if let Some(region) = open {
            return Err(ParseError::UnterminatedConflict {
                start_line: region.start_line,
            });
        }

        Ok(ScannedDocument {
            lines,
            separator,
            chunks,
        })
    }
}

fn marker_label(rest: &str) -> Option<String> {
    let label = rest.trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}
