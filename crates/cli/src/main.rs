//! gitsynth command-line tool.
//!
//! Lists, shows and rewrites the conflict chunks of a file, searches a tree
//! for conflicted files, and exposes the tool layer that LLM clients call so
//! the same operations can be driven by hand.

mod commands;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gitsynth_core::config::{AppConfig, DEFAULT_CONFIG_TOML};
use gitsynth_core::ToolContext;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// gitsynth command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "gitsynth",
    version,
    about = "Inspect and resolve Git merge-conflict chunks one region at a time"
)]
struct Cli {
    /// Path to the TOML configuration file.
    /// Defaults to <config dir>/gitsynth/config.toml when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override: trace, debug, info, warn, error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory that relative paths resolve against.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report whether a file contains conflict markers.
    Check {
        /// File to probe.
        path: String,
    },

    /// List the conflict chunks of a file.
    Chunks {
        /// Conflicted file.
        path: String,

        /// Print machine-readable JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show both sides of one chunk.
    Show {
        /// Conflicted file.
        path: String,

        /// Chunk ID as listed by `chunks`.
        id: usize,
    },

    /// Replace one chunk with new content.
    Replace {
        /// Conflicted file.
        path: String,

        /// Chunk ID as listed by `chunks`.
        id: usize,

        /// Replacement text.
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Read the replacement text from a file.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Refuse the edit unless the chunk still has this fingerprint.
        #[arg(long)]
        fingerprint: Option<String>,
    },

    /// Resolve one chunk by keeping a side.
    Resolve {
        /// Conflicted file.
        path: String,

        /// Chunk ID as listed by `chunks`.
        id: usize,

        /// Resolution: ours, theirs or both.
        #[arg(long)]
        accept: String,

        /// Refuse the edit unless the chunk still has this fingerprint.
        #[arg(long)]
        fingerprint: Option<String>,
    },

    /// Find files under a directory that still contain conflict markers.
    Find {
        /// Directory to search (defaults to --root).
        dir: Option<String>,

        /// Print a JSON array instead of a list.
        #[arg(long)]
        json: bool,
    },

    /// Print the tool definitions offered to LLM clients.
    Tools,

    /// Invoke a tool with a JSON arguments object.
    Call {
        /// Tool name, e.g. `see_file_chunks`.
        tool: String,

        /// Arguments as a JSON object.
        args: String,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            cmd_init(output)
        }
        Commands::Validate => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            cmd_validate(cli.config.as_deref())
        }
        command => {
            let config = load_config(cli.config.as_deref())?;
            init_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));
            let ctx = ToolContext::from_config(&cli.root, &config);

            match command {
                Commands::Check { path } => commands::check(&ctx, &path),
                Commands::Chunks { path, json } => commands::chunks(&ctx, &path, json),
                Commands::Show { path, id } => commands::show(&ctx, &path, id),
                Commands::Replace {
                    path,
                    id,
                    content,
                    file,
                    fingerprint,
                } => {
                    let text = replacement_text(content, file.as_deref())?;
                    commands::replace(&ctx, &path, id, &text, fingerprint.as_deref())
                }
                Commands::Resolve {
                    path,
                    id,
                    accept,
                    fingerprint,
                } => commands::resolve(&ctx, &path, id, &accept, fingerprint.as_deref()),
                Commands::Find { dir, json } => commands::find(&ctx, dir.as_deref(), json),
                Commands::Tools => commands::tools(),
                Commands::Call { tool, args } => commands::call(&ctx, &tool, &args),
                Commands::Init { .. } | Commands::Validate => unreachable!(),
            }
        }
    }
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn default_config_path() -> Option<PathBuf> {
    AppConfig::default_path(dirs::config_dir())
}

/// An explicit `--config` must exist; the default location is optional.
fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let config = match explicit {
        Some(path) => AppConfig::load_from_file(path).context("failed to load configuration file")?,
        None => match default_config_path() {
            Some(path) => {
                AppConfig::load_or_default(&path).context("failed to load configuration file")?
            }
            None => AppConfig::default(),
        },
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn replacement_text(content: Option<String>, file: Option<&Path>) -> Result<String> {
    match (content, file) {
        (Some(content), _) => Ok(content),
        (None, Some(file)) => std::fs::read_to_string(file)
            .with_context(|| format!("failed to read replacement from {}", file.display())),
        (None, None) => {
            std::io::read_to_string(std::io::stdin()).context("failed to read replacement from stdin")
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: Option<PathBuf>) -> Result<()> {
    let output = output
        .or_else(default_config_path)
        .unwrap_or_else(|| PathBuf::from("./gitsynth.toml"));

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output, DEFAULT_CONFIG_TOML).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("Next steps:");
    println!("  1. Adjust scan.ignore_patterns for your repository layout");
    println!(
        "  2. Validate with: gitsynth validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path()
            .ok_or_else(|| anyhow::anyhow!("no config directory on this platform; pass --config"))?,
    };
    println!("Validating configuration: {}", path.display());
    println!();

    let config = AppConfig::load_from_file(&path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Line endings       : {}", config.engine.line_endings);
    println!(
        "  Require fingerprint: {}",
        if config.engine.require_fingerprint { "yes" } else { "no" }
    );
    println!(
        "  Ignore patterns    : {}",
        if config.scan.ignore_patterns.is_empty() {
            "none".to_string()
        } else {
            config.scan.ignore_patterns.join(", ")
        }
    );
    println!(
        "  Max file size      : {}",
        if config.scan.max_file_size == 0 {
            "unlimited".to_string()
        } else {
            format!("{} bytes", config.scan.max_file_size)
        }
    );
    println!("  Skip hidden        : {}", config.scan.skip_hidden);
    println!("  Log level          : {}", config.logging.level);
    println!();
    println!("{}", style::success("Configuration is valid."));

    Ok(())
}
