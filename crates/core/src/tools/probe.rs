use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, ConflictTool, ToolContext};
use crate::conflict::ConflictProbe;
use crate::errors::ToolError;

/// `has_merge_conflicts`: does one file still carry conflict markers?
#[derive(Debug, Default)]
pub struct HasMergeConflictsTool;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HasMergeConflictsArgs {
    #[serde(default)]
    path: String,
}

impl ConflictTool for HasMergeConflictsTool {
    fn name(&self) -> &'static str {
        "has_merge_conflicts"
    }

    fn description(&self) -> &'static str {
        "Check whether a single file still contains Git merge conflict markers (a line starting with <<<<<<<). Returns a JSON object with the path and a has_conflicts boolean."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file to check"
                }
            },
            "required": ["path"]
        })
    }

    fn execute(&self, ctx: &ToolContext, args: &Value) -> Result<String, ToolError> {
        let args: HasMergeConflictsArgs = parse_args(args)?;
        let path = ctx.resolve_path(&args.path)?;
        let has_conflicts = ConflictProbe::has_conflicts(&path)?;
        Ok(json!({ "path": args.path, "has_conflicts": has_conflicts }).to_string())
    }
}
