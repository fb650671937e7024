use std::fmt::Write as _;

use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, ConflictTool, ToolContext};
use crate::conflict::{ChunkRegistry, ConflictChunk};
use crate::errors::{ChunkError, ToolError};

/// `see_file_chunks`: show every conflict chunk of a file.
#[derive(Debug, Default)]
pub struct SeeFileChunksTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeeFileChunksArgs {
    #[serde(default)]
    path: String,
}

impl ConflictTool for SeeFileChunksTool {
    fn name(&self) -> &'static str {
        "see_file_chunks"
    }

    fn description(&self) -> &'static str {
        "View the conflict chunks in a file. Shows each chunk with its ID, line span, fingerprint, our code and incoming code. IDs start at 0 for the chunk closest to the top of the file and are only valid until the file is next edited."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file with conflict chunks to analyze"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(&self, ctx: &ToolContext, args: &Value) -> Result<String, ToolError> {
        let args: SeeFileChunksArgs = parse_args(args)?;
        let path = ctx.resolve_path(&args.path)?;

        match ChunkRegistry::list_chunks(&path) {
            Ok(chunks) => Ok(render_chunks(&args.path, &chunks)),
            Err(ChunkError::NoConflicts(_)) => {
                Ok(format!("No merge conflicts found in file: {}", args.path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn render_chunks(display_path: &str, chunks: &[ConflictChunk]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "File: {}\n", display_path);
    let _ = writeln!(out, "Found {} conflict chunks:\n", chunks.len());

    for chunk in chunks {
        let _ = writeln!(
            out,
            "Chunk ID: {} (lines {}-{}, fingerprint {})",
            chunk.id,
            chunk.start_line,
            chunk.end_line,
            chunk.fingerprint()
        );
        write_side(&mut out, "Our code", chunk.ours_label.as_deref(), &chunk.ours);
        if let Some(base) = &chunk.base {
            write_side(&mut out, "Base code", None, base);
        }
        write_side(
            &mut out,
            "Incoming code",
            chunk.theirs_label.as_deref(),
            &chunk.theirs,
        );
        out.push_str("---\n\n");
    }

    if chunks.len() > 1 {
        let _ = writeln!(
            out,
            "Edit chunks from the highest ID down to 0; editing a chunk renumbers every chunk below it."
        );
    }
    out
}

fn write_side(out: &mut String, title: &str, label: Option<&str>, text: &str) {
    match label {
        Some(label) => {
            let _ = writeln!(out, "{} ({}):", title, label);
        }
        None => {
            let _ = writeln!(out, "{}:", title);
        }
    }
    let _ = writeln!(out, "```\n{}\n```\n", text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_chunks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.py"),
            "x = 1\n<<<<<<< HEAD\ny = 2\n=======\ny = 3\n>>>>>>> topic\n",
        )
        .unwrap();
        let ctx = ToolContext::new(dir.path());

        let out = SeeFileChunksTool
            .execute(&ctx, &json!({ "path": "a.py" }))
            .unwrap();
        assert!(out.starts_with("File: a.py\n\nFound 1 conflict chunks:"));
        assert!(out.contains("Chunk ID: 0 (lines 2-6, fingerprint "));
        assert!(out.contains("Our code (HEAD):\n```\ny = 2\n```"));
        assert!(out.contains("Incoming code (topic):\n```\ny = 3\n```"));
        assert!(!out.contains("highest ID"));
    }

    #[test]
    fn test_clean_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ok.py"), "x = 1\n").unwrap();
        let ctx = ToolContext::new(dir.path());
        let out = SeeFileChunksTool
            .execute(&ctx, &json!({ "path": "ok.py" }))
            .unwrap();
        assert_eq!(out, "No merge conflicts found in file: ok.py");
    }

    #[test]
    fn test_parse_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.py"), "<<<<<<< HEAD\nx\n").unwrap();
        let ctx = ToolContext::new(dir.path());
        let err = SeeFileChunksTool
            .execute(&ctx, &json!({ "path": "bad.py" }))
            .unwrap_err();
        assert!(matches!(err, ToolError::Engine(ChunkError::Parse { .. })));
    }
}
