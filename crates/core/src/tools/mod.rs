//! Tool adapter layer.
//!
//! Exposes the chunk engine as named, schema-described operations that an
//! external decision-making client (an LLM tool-calling loop, or the CLI)
//! can invoke with JSON arguments. Tools validate their own inputs, delegate
//! to the engine, and report failures as text without changing their
//! meaning. No business logic lives here.

mod chunks;
mod edit;
mod find;
mod probe;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::conflict::ChunkMutator;
use crate::errors::ToolError;
use crate::file_policy::FilePolicy;

pub use chunks::SeeFileChunksTool;
pub use edit::EditFileChunkTool;
pub use find::FindMergeConflictsTool;
pub use probe::HasMergeConflictsTool;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything a tool needs besides its arguments.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Relative tool paths resolve against this directory.
    pub root: PathBuf,
    pub policy: FilePolicy,
    pub mutator: ChunkMutator,
    /// Reject `edit_file_chunk` calls without a fingerprint.
    pub require_fingerprint: bool,
}

impl ToolContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &AppConfig::default())
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &AppConfig) -> Self {
        Self {
            root: root.into(),
            policy: FilePolicy::from(&config.scan),
            mutator: ChunkMutator::new(config.engine.line_endings),
            require_fingerprint: config.engine.require_fingerprint,
        }
    }

    /// Validate a caller-supplied path and resolve it against `root`.
    pub fn resolve_path(&self, raw: &str) -> Result<PathBuf, ToolError> {
        if raw.trim().is_empty() {
            return Err(ToolError::InvalidInput("path must not be empty".into()));
        }
        let path = Path::new(raw);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.root.join(path))
        }
    }
}

// ---------------------------------------------------------------------------
// Tool trait
// ---------------------------------------------------------------------------

/// One operation callable by the decision-making client.
pub trait ConflictTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn schema(&self) -> Value;

    /// Does this tool write to disk?
    fn is_side_effecting(&self) -> bool {
        false
    }

    fn execute(&self, ctx: &ToolContext, args: &Value) -> Result<String, ToolError>;
}

/// Deserialize tool arguments, reporting failures as invalid input.
pub(crate) fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    serde_json::from_value(args.clone())
        .map_err(|e| ToolError::InvalidInput(format!("failed to parse parameters: {}", e)))
}

/// Tool description in the shape LLM tool-calling protocols expect.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// Result of a tool call with errors already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResponse {
    pub content: String,
    pub is_error: bool,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// The set of tools offered to a client.
pub struct ToolRegistry {
    tools: Vec<Box<dyn ConflictTool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with every chunk tool.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(HasMergeConflictsTool));
        registry.register(Box::new(FindMergeConflictsTool));
        registry.register(Box::new(SeeFileChunksTool));
        registry.register(Box::new(EditFileChunkTool));
        registry
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Box<dyn ConflictTool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ConflictTool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name(),
                description: t.description(),
                input_schema: t.schema(),
            })
            .collect()
    }

    /// Run `name` and return its output or typed error.
    pub fn execute(&self, ctx: &ToolContext, name: &str, args: &Value) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        info!(tool = name, side_effecting = tool.is_side_effecting(), "executing tool");
        tool.execute(ctx, args)
    }

    /// Run `name` and render any error as text for the client.
    pub fn call(&self, ctx: &ToolContext, name: &str, args: &Value) -> ToolResponse {
        match self.execute(ctx, name, args) {
            Ok(content) => ToolResponse {
                content,
                is_error: false,
            },
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                ToolResponse {
                    content: format!("Error: {}", e),
                    is_error: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TWO_CHUNKS: &str = "\
fn main() {
<<<<<<< HEAD
    println!(\"ours\");
=======
    println!(\"theirs\");
>>>>>>> feature
    let x = 1;
<<<<<<< HEAD
    x + 1
=======
    x + 2
>>>>>>> feature
}
";

    fn setup() -> (tempfile::TempDir, ToolContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.rs"), TWO_CHUNKS).unwrap();
        std::fs::write(dir.path().join("clean.rs"), "fn f() {}\n").unwrap();
        let ctx = ToolContext::new(dir.path());
        (dir, ctx)
    }

    #[test]
    fn test_definitions() {
        let registry = ToolRegistry::with_defaults();
        let names = registry.names();
        assert_eq!(
            names,
            vec![
                "has_merge_conflicts",
                "find_merge_conflicts",
                "see_file_chunks",
                "edit_file_chunk"
            ]
        );
        for def in registry.definitions() {
            assert_eq!(def.input_schema["type"], "object");
        }
        let edit = registry.get("edit_file_chunk").unwrap();
        assert!(edit.is_side_effecting());
        assert!(edit.description().contains("highest"));
    }

    #[test]
    fn test_unknown_tool() {
        let (_dir, ctx) = setup();
        let resp = ToolRegistry::with_defaults().call(&ctx, "delete_file", &json!({}));
        assert!(resp.is_error);
        assert_eq!(resp.content, "Error: unknown tool: delete_file");
    }

    #[test]
    fn test_empty_path_rejected() {
        let (_dir, ctx) = setup();
        let registry = ToolRegistry::with_defaults();
        for tool in ["has_merge_conflicts", "see_file_chunks"] {
            let err = registry.execute(&ctx, tool, &json!({ "path": "  " })).unwrap_err();
            assert!(matches!(err, ToolError::InvalidInput(_)), "{tool}");
        }
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let (_dir, ctx) = setup();
        let registry = ToolRegistry::with_defaults();
        for tool in registry.names() {
            let err = registry
                .execute(&ctx, tool, &json!({ "path": "main.rs", "verbose": true }))
                .unwrap_err();
            assert!(matches!(err, ToolError::InvalidInput(_)), "{tool}");
        }
    }

    #[test]
    fn test_descending_edits_through_tools() {
        let (dir, ctx) = setup();
        let registry = ToolRegistry::with_defaults();

        let listing = registry
            .execute(&ctx, "see_file_chunks", &json!({ "path": "main.rs" }))
            .unwrap();
        assert!(listing.contains("Found 2 conflict chunks"));

        registry
            .execute(
                &ctx,
                "edit_file_chunk",
                &json!({ "path": "main.rs", "chunk_id": 1, "new_content": "    x + 3" }),
            )
            .unwrap();
        let msg = registry
            .execute(
                &ctx,
                "edit_file_chunk",
                &json!({
                    "path": "main.rs",
                    "chunk_id": 0,
                    "new_content": "    println!(\"ours\");\n    println!(\"theirs\");"
                }),
            )
            .unwrap();
        assert!(msg.contains("Successfully replaced conflict chunk 0"));

        let after = std::fs::read_to_string(dir.path().join("main.rs")).unwrap();
        assert_eq!(
            after,
            "fn main() {\n    println!(\"ours\");\n    println!(\"theirs\");\n    let x = 1;\n    x + 3\n}\n"
        );

        let probe = registry
            .execute(&ctx, "has_merge_conflicts", &json!({ "path": "main.rs" }))
            .unwrap();
        let probe: Value = serde_json::from_str(&probe).unwrap();
        assert_eq!(probe["has_conflicts"], false);
    }
}
