//! Graphtable CLI
//!
//! Command-line entry points for:
//! - Seeding the video platform demo into an in-memory table and printing
//!   the query report (`demo`)
//! - Re-running the report over a saved table snapshot (`report`)
//! - Inspecting a catalog, built in or loaded from JSON config (`catalog`)
//! - Showing how ids and kind tags encode into record keys (`keys`)

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use graphtable_engine::keys::{self, EntityId};
use graphtable_engine::{Catalog, CatalogConfig, GraphTableConfig, ItemKind};
use graphtable_store::{MemoryStore, RecordStore, StoreConfig, TableSnapshot};
use graphtable_video::{query_report, seed_demo, ReportSection, VideoPlatform};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "graphtable")]
#[command(author, version, about = "Graphtable: typed entity graphs in a single record table")]
struct Cli {
    /// Log debug events to stderr (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the demo dataset into a memory table and print the query report.
    Demo {
        /// Store limits and catalog (only the `store` section is used)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the resulting table to a JSON snapshot
        #[arg(long)]
        dump: Option<PathBuf>,
        /// Print the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the query report for a previously dumped snapshot.
    Report {
        /// Snapshot written by `demo --dump`
        snapshot: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Show the kinds of a catalog.
    ///
    /// Without `--config` the built-in video platform catalog is shown.
    Catalog {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print the catalog as a JSON config document
        #[arg(long)]
        export: bool,
    },

    /// Print the record key for an entity or an edge.
    Keys {
        /// Kind tag
        kind: String,
        /// Entity id, or the partition side of an edge
        from: String,
        /// Lookup side of an edge (required for relationship kinds)
        to: Option<String>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Demo { config, dump, json } => cmd_demo(config.as_deref(), dump.as_deref(), json),
        Commands::Report { snapshot, json } => cmd_report(&snapshot, json),
        Commands::Catalog { config, export } => cmd_catalog(config.as_deref(), export),
        Commands::Keys {
            kind,
            from,
            to,
            config,
        } => cmd_keys(&kind, &from, to.as_deref(), config.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_demo(config: Option<&Path>, dump: Option<&Path>, json: bool) -> Result<()> {
    let store_config = match config {
        Some(path) => {
            let config = GraphTableConfig::load(path)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))?;
            config.store
        }
        None => StoreConfig::default(),
    };

    let platform = VideoPlatform::new(MemoryStore::with_config(store_config)?)?;
    seed_demo(&platform)?;

    if !json {
        println!("{}", "--- Scan entities and relationships ---".bold());
        for record in platform.engine().scan()? {
            println!("{record}");
        }
    }
    print_report(&query_report(&platform)?, json)?;

    if let Some(path) = dump {
        platform.store().snapshot().save(path)?;
        eprintln!(
            "{} {} ({} records)",
            "wrote".green().bold(),
            path.display().to_string().bold(),
            platform.store().len()
        );
    }
    Ok(())
}

fn cmd_report(snapshot: &Path, json: bool) -> Result<()> {
    let snapshot = TableSnapshot::load(snapshot)
        .map_err(|e| anyhow!("failed to load snapshot {}: {e}", snapshot.display()))?;
    let store = MemoryStore::from_snapshot(snapshot, StoreConfig::default())?;
    let platform = VideoPlatform::new(store)?;
    print_report(&query_report(&platform)?, json)
}

fn cmd_catalog(config: Option<&Path>, export: bool) -> Result<()> {
    let catalog = load_catalog(config)?;

    if export {
        let config = GraphTableConfig {
            catalog: CatalogConfig::from(&catalog),
            ..GraphTableConfig::default()
        };
        println!("{}", config.to_json()?);
        return Ok(());
    }

    for (tag, kind) in catalog.iter() {
        let detail = match kind {
            ItemKind::Entity => String::new(),
            ItemKind::OneToMany { one, many } => format!("{many} -> {one}"),
            ItemKind::ManyToMany { left, right } => format!("{left} <-> {right}"),
        };
        println!(
            "{:<28} {:<13} {}",
            tag.to_string().bold(),
            kind.category().to_string().cyan(),
            detail
        );
    }
    println!("{} {} kinds", "ok".green().bold(), catalog.len());
    Ok(())
}

fn cmd_keys(kind: &str, from: &str, to: Option<&str>, config: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(config)?;
    let (tag, item) = catalog.resolve(kind)?;
    let from = EntityId::new(from)?;

    let key = match (item, to) {
        (ItemKind::Entity, None) => keys::entity_key(&from),
        (ItemKind::Entity, Some(_)) => {
            return Err(anyhow!("{tag} is an entity kind; it takes a single id"));
        }
        (_, Some(to)) => keys::edge_key(tag, &from, &EntityId::new(to)?),
        (_, None) => {
            return Err(anyhow!(
                "{tag} is {}; both ids are required",
                item.category()
            ));
        }
    };

    println!("{:<12} {}", "primary_key".bold(), key.primary_key);
    println!("{:<12} {}", "sort_key".bold(), key.sort_key);
    println!("{:<12} {}", "lookup_key".bold(), key.sort_key);
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn load_catalog(config: Option<&Path>) -> Result<Catalog> {
    match config {
        Some(path) => {
            let config = GraphTableConfig::load(path)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))?;
            Ok(config.validate()?)
        }
        None => Ok(graphtable_video::video_catalog()?),
    }
}

fn print_report(report: &[ReportSection], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    for section in report {
        println!("{}", format!("--- {} ---", section.title).bold());
        if section.ids.is_empty() {
            println!("  {}", "(none)".dimmed());
        } else {
            println!("  {}", section.ids.join(", "));
        }
    }
    Ok(())
}
