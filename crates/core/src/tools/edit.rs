use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, ConflictTool, ToolContext};
use crate::conflict::{ChunkRegistry, ConflictProbe};
use crate::errors::{ChunkError, ToolError};

/// `edit_file_chunk`: replace one whole conflict chunk with merged text.
#[derive(Debug, Default)]
pub struct EditFileChunkTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EditFileChunkArgs {
    #[serde(default)]
    path: String,
    chunk_id: i64,
    new_content: String,
    #[serde(default)]
    fingerprint: Option<String>,
}

impl ConflictTool for EditFileChunkTool {
    fn name(&self) -> &'static str {
        "edit_file_chunk"
    }

    fn description(&self) -> &'static str {
        "Resolve a specific conflict chunk in a file by replacing the whole chunk, markers included, with new content. Identifies the chunk by its ID number (starting from 0 for the first chunk at the top of the file). Editing a chunk renumbers every chunk after it, so when a file has several chunks, edit the chunk with the highest ID first and work down to chunk 0. Pass the fingerprint shown by see_file_chunks to have the edit refused if the chunk has moved."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file containing the conflict chunk"
                },
                "chunk_id": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "The ID of the conflict chunk to edit (zero-indexed, with chunk 0 being the first chunk from the top of the file)"
                },
                "new_content": {
                    "type": "string",
                    "description": "The content to replace the entire conflict chunk with. An empty string removes the chunk."
                },
                "fingerprint": {
                    "type": "string",
                    "description": "Optional fingerprint of the chunk as reported by see_file_chunks"
                }
            },
            "required": ["path", "chunk_id", "new_content"]
        })
    }

    fn is_side_effecting(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &ToolContext, args: &Value) -> Result<String, ToolError> {
        let args: EditFileChunkArgs = parse_args(args)?;
        let path = ctx.resolve_path(&args.path)?;
        let chunk_id = usize::try_from(args.chunk_id).map_err(|_| {
            ToolError::InvalidInput(format!("chunk_id must be >= 0 (got {})", args.chunk_id))
        })?;
        let fingerprint = args
            .fingerprint
            .as_deref()
            .map(str::trim)
            .filter(|fp| !fp.is_empty());
        if ctx.require_fingerprint && fingerprint.is_none() {
            return Err(ToolError::FingerprintRequired);
        }

        if !ConflictProbe::has_conflicts(&path)? {
            return Err(ChunkError::NoConflicts(args.path).into());
        }

        match fingerprint {
            Some(fp) => ctx
                .mutator
                .replace_chunk_checked(&path, chunk_id, &args.new_content, fp)?,
            None => ctx.mutator.replace_chunk(&path, chunk_id, &args.new_content)?,
        }

        let remaining = match ChunkRegistry::list_chunks(&path) {
            Ok(chunks) => format!(" ({} conflict chunks remain)", chunks.len()),
            Err(ChunkError::NoConflicts(_)) => " (no conflict chunks remain)".to_string(),
            Err(e) => format!(" (remaining chunks could not be counted: {})", e),
        };
        Ok(format!(
            "Successfully replaced conflict chunk {} in file {}{}",
            chunk_id, args.path, remaining
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::conflict::MarkerScanner;

    const CONFLICT: &str = "<<<<<<< HEAD\nold\n=======\nnew\n>>>>>>> b\n";

    fn setup(content: &str) -> (tempfile::TempDir, ToolContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), content).unwrap();
        let ctx = ToolContext::new(dir.path());
        (dir, ctx)
    }

    #[test]
    fn test_negative_id_rejected_before_file_access() {
        let (dir, ctx) = setup(CONFLICT);
        let err = EditFileChunkTool
            .execute(
                &ctx,
                &json!({ "path": "f.txt", "chunk_id": -1, "new_content": "x" }),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid input: chunk_id must be >= 0 (got -1)");
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), CONFLICT);
    }

    #[test]
    fn test_missing_field_rejected() {
        let (_dir, ctx) = setup(CONFLICT);
        let err = EditFileChunkTool
            .execute(&ctx, &json!({ "path": "f.txt", "chunk_id": 0 }))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
        assert!(err.to_string().contains("new_content"));
    }

    #[test]
    fn test_out_of_range_message() {
        let (_dir, ctx) = setup(CONFLICT);
        let err = EditFileChunkTool
            .execute(
                &ctx,
                &json!({ "path": "f.txt", "chunk_id": 3, "new_content": "x" }),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "chunk_id 3 out of range, file has 1 chunks");
    }

    #[test]
    fn test_clean_file_rejected() {
        let (_dir, ctx) = setup("resolved\n");
        let err = EditFileChunkTool
            .execute(
                &ctx,
                &json!({ "path": "f.txt", "chunk_id": 0, "new_content": "x" }),
            )
            .unwrap_err();
        assert!(matches!(err, ToolError::Engine(ChunkError::NoConflicts(_))));
    }

    #[test]
    fn test_fingerprint_required_by_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), CONFLICT).unwrap();
        let mut config = AppConfig::default();
        config.engine.require_fingerprint = true;
        let ctx = ToolContext::from_config(dir.path(), &config);

        let err = EditFileChunkTool
            .execute(
                &ctx,
                &json!({ "path": "f.txt", "chunk_id": 0, "new_content": "x" }),
            )
            .unwrap_err();
        assert!(matches!(err, ToolError::FingerprintRequired));

        let fp = MarkerScanner::scan(CONFLICT).unwrap()[0].fingerprint();
        let out = EditFileChunkTool
            .execute(
                &ctx,
                &json!({ "path": "f.txt", "chunk_id": 0, "new_content": "merged", "fingerprint": fp }),
            )
            .unwrap();
        assert_eq!(
            out,
            "Successfully replaced conflict chunk 0 in file f.txt (no conflict chunks remain)"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "merged\n"
        );
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let (dir, ctx) = setup(CONFLICT);
        let err = EditFileChunkTool
            .execute(
                &ctx,
                &json!({ "path": "f.txt", "chunk_id": 0, "new_content": "x", "force": true }),
            )
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
        assert!(err.to_string().contains("force"));
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), CONFLICT);
    }

    #[test]
    fn test_failed_recount_is_reported() {
        let (_dir, ctx) = setup(CONFLICT);
        let out = EditFileChunkTool
            .execute(
                &ctx,
                &json!({ "path": "f.txt", "chunk_id": 0, "new_content": "<<<<<<< left open" }),
            )
            .unwrap();
        assert!(out.starts_with("Successfully replaced conflict chunk 0 in file f.txt"));
        assert!(out.contains("(remaining chunks could not be counted: "));
        assert!(out.contains("unterminated conflict region starting at line 1"));
    }
}
