use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, ConflictTool, ToolContext};
use crate::conflict::ConflictFinder;
use crate::errors::ToolError;

/// `find_merge_conflicts`: list every file under a directory that still has
/// conflict markers.
#[derive(Debug, Default)]
pub struct FindMergeConflictsTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FindMergeConflictsArgs {
    #[serde(default)]
    path: Option<String>,
}

impl ConflictTool for FindMergeConflictsTool {
    fn name(&self) -> &'static str {
        "find_merge_conflicts"
    }

    fn description(&self) -> &'static str {
        "Lists all files that contain Git merge conflict markers (a line starting with <<<<<<<). Use this to identify files with unresolved merge conflicts. Returns a JSON array of paths relative to the searched directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Optional relative path to search for merge conflicts. Defaults to the working directory."
                }
            }
        })
    }

    fn execute(&self, ctx: &ToolContext, args: &Value) -> Result<String, ToolError> {
        let args: FindMergeConflictsArgs = parse_args(args)?;
        let dir = match args.path.as_deref() {
            Some(raw) if !raw.trim().is_empty() => ctx.resolve_path(raw)?,
            _ => ctx.root.clone(),
        };

        let files: Vec<String> = ConflictFinder::find(&dir, &ctx.policy)?
            .into_iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();

        Ok(json!(files).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(
            dir.path().join("src/a.rs"),
            "<<<<<<< HEAD\nx\n=======\ny\n>>>>>>> b\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "Title\n=======\n").unwrap();
        let ctx = ToolContext::new(dir.path());

        let out = FindMergeConflictsTool.execute(&ctx, &json!({})).unwrap();
        assert_eq!(out, r#"["src/a.rs"]"#);

        let out = FindMergeConflictsTool
            .execute(&ctx, &json!({ "path": "src" }))
            .unwrap();
        assert_eq!(out, r#"["a.rs"]"#);
    }
}
