//! Chunk subcommands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::{json, Value};

use gitsynth_core::conflict::{
    ChunkRegistry, ConflictFinder, ConflictProbe, ConflictResolver, Resolution,
};
use gitsynth_core::errors::ChunkError;
use gitsynth_core::{ConflictChunk, ToolContext, ToolRegistry};

use crate::style;

/// Preview width for chunk sides in the table.
const PREVIEW_LEN: usize = 40;

pub fn check(ctx: &ToolContext, raw_path: &str) -> Result<()> {
    let path = ctx.resolve_path(raw_path)?;
    if ConflictProbe::has_conflicts(&path)? {
        println!("{}", style::warn(&format!("{} has merge conflicts", raw_path)));
    } else {
        println!("{}", style::success(&format!("{} has no merge conflicts", raw_path)));
    }
    Ok(())
}

pub fn chunks(ctx: &ToolContext, raw_path: &str, as_json: bool) -> Result<()> {
    let path = ctx.resolve_path(raw_path)?;
    let chunks = match ChunkRegistry::list_chunks(&path) {
        Ok(chunks) => chunks,
        Err(ChunkError::NoConflicts(_)) if as_json => Vec::new(),
        Err(ChunkError::NoConflicts(_)) => {
            println!("{}", style::success(&format!("No merge conflicts in {}", raw_path)));
            return Ok(());
        }
        Err(e) => return Err(e).context("failed to list conflict chunks"),
    };

    if as_json {
        let listing: Vec<Value> = chunks.iter().map(chunk_json).collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style::header(&format!("{} ({} conflict chunks)", raw_path, chunks.len()))
    );
    println!();

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Lines", "Fingerprint", "Ours", "Theirs"]);

    for chunk in &chunks {
        table.add_row(vec![
            Cell::new(chunk.id),
            Cell::new(format!("{}-{}", chunk.start_line, chunk.end_line)),
            Cell::new(chunk.fingerprint()),
            Cell::new(preview(&chunk.ours)),
            Cell::new(preview(&chunk.theirs)),
        ]);
    }

    println!("{}", table);
    if chunks.len() > 1 {
        println!(
            "{}",
            style::dim("Replace chunks from the highest ID down; each edit renumbers later chunks.")
        );
    }
    println!();

    Ok(())
}

pub fn show(ctx: &ToolContext, raw_path: &str, id: usize) -> Result<()> {
    let path = ctx.resolve_path(raw_path)?;
    let chunk = ChunkRegistry::get_chunk(&path, id)?;

    println!();
    println!(
        "{}",
        style::header(&format!(
            "{} chunk {} (lines {}-{})",
            raw_path, chunk.id, chunk.start_line, chunk.end_line
        ))
    );
    println!("{}", style::dim(&format!("fingerprint {}", chunk.fingerprint())));
    println!();
    println!("{}", style::ours(chunk.ours_label.as_deref()));
    print_side(&chunk.ours);
    if let Some(ref base) = chunk.base {
        println!("{}", style::base());
        print_side(base);
    }
    println!("{}", style::theirs(chunk.theirs_label.as_deref()));
    print_side(&chunk.theirs);

    Ok(())
}

pub fn replace(
    ctx: &ToolContext,
    raw_path: &str,
    id: usize,
    content: &str,
    fingerprint: Option<&str>,
) -> Result<()> {
    let path = ctx.resolve_path(raw_path)?;
    let result = match fingerprint {
        Some(fp) => ctx.mutator.replace_chunk_checked(&path, id, content, fp),
        None => ctx.mutator.replace_chunk(&path, id, content),
    };
    result.with_context(|| format!("failed to replace chunk {} in {}", id, raw_path))?;

    println!(
        "{}",
        style::success(&format!("Replaced chunk {} in {}", id, raw_path))
    );
    report_remaining(&path, raw_path)
}

pub fn resolve(
    ctx: &ToolContext,
    raw_path: &str,
    id: usize,
    accept: &str,
    fingerprint: Option<&str>,
) -> Result<()> {
    let resolution: Resolution = accept.parse().map_err(anyhow::Error::msg)?;
    let path = ctx.resolve_path(raw_path)?;

    ConflictResolver::resolve(&ctx.mutator, &path, id, &resolution, fingerprint)
        .with_context(|| format!("failed to resolve chunk {} in {}", id, raw_path))?;

    println!(
        "{}",
        style::success(&format!(
            "Chunk {} in {} resolved (accepted {})",
            id,
            raw_path,
            resolution.label()
        ))
    );
    report_remaining(&path, raw_path)
}

pub fn find(ctx: &ToolContext, dir: Option<&str>, as_json: bool) -> Result<()> {
    let root = match dir {
        Some(dir) => ctx.resolve_path(dir)?,
        None => ctx.root.clone(),
    };
    let files = ConflictFinder::find(&root, &ctx.policy)
        .with_context(|| format!("failed to search {}", root.display()))?;

    if as_json {
        println!("{}", files_json(&files));
        return Ok(());
    }

    if files.is_empty() {
        println!("{}", style::success("No conflicted files found"));
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style::header(&format!("Conflicted files ({})", files.len()))
    );
    for file in &files {
        println!("  {}", file.display());
    }
    println!();

    Ok(())
}

pub fn tools() -> Result<()> {
    let definitions = ToolRegistry::with_defaults().definitions();
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}

pub fn call(ctx: &ToolContext, tool: &str, raw_args: &str) -> Result<()> {
    let args: Value = serde_json::from_str(raw_args).context("arguments are not valid JSON")?;
    let output = ToolRegistry::with_defaults()
        .execute(ctx, tool, &args)
        .with_context(|| format!("tool '{}' failed", tool))?;
    println!("{}", output);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn chunk_json(chunk: &ConflictChunk) -> Value {
    json!({
        "id": chunk.id,
        "start_line": chunk.start_line,
        "end_line": chunk.end_line,
        "fingerprint": chunk.fingerprint(),
        "ours_label": chunk.ours_label,
        "theirs_label": chunk.theirs_label,
        "ours": chunk.ours,
        "base": chunk.base,
        "theirs": chunk.theirs,
    })
}

/// JSON array of paths; names that are not valid UTF-8 are rendered lossily.
fn files_json(files: &[PathBuf]) -> String {
    let names: Vec<String> = files
        .iter()
        .map(|f| f.to_string_lossy().into_owned())
        .collect();
    json!(names).to_string()
}

fn report_remaining(path: &Path, raw_path: &str) -> Result<()> {
    let remaining = match ChunkRegistry::list_chunks(path) {
        Ok(chunks) => chunks.len(),
        Err(ChunkError::NoConflicts(_)) => 0,
        Err(e) => return Err(e).context("failed to re-scan file"),
    };
    if remaining == 0 {
        println!("{}", style::success(&format!("{} is free of conflicts", raw_path)));
    } else {
        println!(
            "{}",
            style::dim(&format!("{} conflict chunks remain in {}", remaining, raw_path))
        );
    }
    Ok(())
}

fn print_side(text: &str) {
    println!("{}", style::dim("```"));
    if !text.is_empty() {
        println!("{}", text);
    }
    println!("{}", style::dim("```"));
}

/// First line of `text`, cut to the preview width.
fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or("");
    let more = text.lines().nth(1).is_some();
    let mut out: String = first.chars().take(PREVIEW_LEN).collect();
    if more || first.chars().count() > PREVIEW_LEN {
        out.push_str("...");
    }
    if out.is_empty() {
        out.push_str("(empty)");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview() {
        assert_eq!(preview("one line"), "one line");
        assert_eq!(preview("first\nsecond"), "first...");
        assert_eq!(preview(""), "(empty)");
        assert_eq!(preview(&"x".repeat(50)), format!("{}...", "x".repeat(40)));
    }

    #[test]
    fn test_files_json() {
        let files = vec![PathBuf::from("src/a.rs"), PathBuf::from("b.txt")];
        assert_eq!(files_json(&files), r#"["src/a.rs","b.txt"]"#);
    }

    #[cfg(unix)]
    #[test]
    fn test_files_json_with_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let files = vec![PathBuf::from(OsStr::from_bytes(b"bad\xffname.rs"))];
        assert_eq!(files_json(&files), "[\"bad\u{fffd}name.rs\"]");
    }
}
