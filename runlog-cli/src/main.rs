//! # runlog CLI
//!
//! Command-line interface for inspecting simulation JSON logs.

mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use runlog_core::Database;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "runlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a log file and print a node
    Show {
        /// Log file to load
        file: PathBuf,

        /// "/"-separated path into the tree (whole tree if omitted)
        subpath: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,
    },

    /// List the child keys of a node
    Keys {
        /// Log file to load
        file: PathBuf,

        /// "/"-separated path into the tree (whole tree if omitted)
        subpath: Option<String>,
    },

    /// Reprint a node whenever the file changes on disk
    Watch {
        /// Log file to follow
        file: PathBuf,

        /// "/"-separated path into the tree (whole tree if omitted)
        subpath: Option<String>,

        /// Poll interval for the dirty flag, in milliseconds
        #[arg(long, default_value_t = 500)]
        interval: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Tree,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Show {
            file,
            subpath,
            format,
        } => show(&file, subpath.as_deref(), format),
        Commands::Keys { file, subpath } => keys(&file, subpath.as_deref()),
        Commands::Watch {
            file,
            subpath,
            interval,
        } => watch(&file, subpath.as_deref(), interval),
    }
}

fn show(file: &Path, subpath: Option<&str>, format: OutputFormat) -> Result<()> {
    let db = Database::default();
    db.load(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let node = db.get(file, subpath)?;

    match format {
        OutputFormat::Tree => print!("{}", render::render(&node)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*node)?),
    }
    Ok(())
}

fn keys(file: &Path, subpath: Option<&str>) -> Result<()> {
    let db = Database::default();
    db.load(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let node = db.get(file, subpath)?;

    for key in node.keys() {
        println!("{key}");
    }
    Ok(())
}

fn watch(file: &Path, subpath: Option<&str>, interval: u64) -> Result<()> {
    let db = Database::default();
    db.load(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    println!("Watching {} (Ctrl+C to stop)...\n", file.display());
    print!("{}", render::render(&*db.get(file, subpath)?));

    loop {
        std::thread::sleep(Duration::from_millis(interval));
        if !db.is_dirty(file) {
            continue;
        }
        match db.get(file, subpath) {
            Ok(node) => {
                println!("--- changed ---");
                print!("{}", render::render(&node));
                if let Some(err) = db.last_error(file) {
                    eprintln!("(stale: reload failed: {err})");
                }
            }
            Err(err) => eprintln!("Error: {err}"),
        }
    }
}
