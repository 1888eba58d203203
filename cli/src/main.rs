//! blockarchive CLI — inspect archive layouts and check archive destinations.
//!
//! Usage:
//! ```bash
//! blockarchive info
//! blockarchive layout --schema 7
//! blockarchive check  --config archive.json
//! blockarchive check  --path /var/lib/node/archive.log
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use blockarchive_core::{ArchiveConfig, ArchiveWriter, SchemaVersion, WriterState};
use blockarchive_observability::{init_tracing, LogConfig};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blockarchive",
    about = "Block archival logger — schema layouts and destination checks",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit JSON logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show supported schema versions and the default configuration
    Info,

    /// Print the ordered field list of a schema version
    Layout {
        /// Schema version (default: current)
        #[arg(long)]
        schema: Option<u64>,
    },

    /// Check that the archive destination can be opened for appending.
    /// Creates the file if it is missing; never writes to it.
    Check {
        /// JSON archive config file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Destination path (overrides the config file)
        #[arg(long, env = "BLOCKARCHIVE_PATH")]
        path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&LogConfig {
        level: cli.log_level.clone(),
        json: cli.json_logs,
        ..Default::default()
    });

    match cli.command {
        Commands::Info => cmd_info(),
        Commands::Layout { schema } => cmd_layout(schema),
        Commands::Check { config, path } => cmd_check(config, path),
    }
}

fn cmd_info() -> Result<()> {
    let defaults = ArchiveConfig::default();
    println!("BlockArchive v{}", env!("CARGO_PKG_VERSION"));
    let versions: Vec<String> = SchemaVersion::ALL.iter().map(|v| v.to_string()).collect();
    println!("  Schema versions: {}", versions.join(", "));
    println!("  Current schema: {}", SchemaVersion::CURRENT);
    println!("  Field delimiter: TAB, one record per line");
    println!("  Default config:");
    println!("{}", serde_json::to_string_pretty(&defaults)?);
    Ok(())
}

fn cmd_layout(schema: Option<u64>) -> Result<()> {
    let version = match schema {
        Some(v) => SchemaVersion::try_from(v)?,
        None => SchemaVersion::CURRENT,
    };
    println!("Schema {version} ({} fields):", version.field_count());
    for (i, field) in version.layout().iter().enumerate() {
        println!("  {:>2}  {}", i + 1, field.name());
    }
    Ok(())
}

fn cmd_check(config: Option<PathBuf>, path: Option<PathBuf>) -> Result<()> {
    let mut cfg = match &config {
        Some(file) => ArchiveConfig::from_json_file(file)
            .with_context(|| format!("loading {}", file.display()))?,
        None => ArchiveConfig::default(),
    };
    if let Some(path) = path {
        cfg.path = path;
    }
    cfg.validate()?;

    let mut writer = ArchiveWriter::new(cfg.path.clone());
    writer
        .open()
        .with_context(|| format!("opening {} for append", cfg.path.display()))?;
    if writer.state() != WriterState::Open {
        bail!("{} did not open", cfg.path.display());
    }
    writer.close();

    println!("OK  {} is appendable", cfg.path.display());
    println!(
        "    schema {}, console summary {}",
        cfg.schema_version,
        if cfg.console_summary { "on" } else { "off" }
    );
    Ok(())
}
