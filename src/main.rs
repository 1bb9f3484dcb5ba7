//! Command-line access to the content database
//!
//! Usage:
//!   bonnie-db tables                      # List tables and their ID ranges
//!   bonnie-db used item_template          # IDs in use
//!   bonnie-db find quest --base 100       # Next free ID, without claiming it
//!   bonnie-db reserve shop                # Claim the next free ID
//!   bonnie-db show alliance 3             # Print one record
//!   bonnie-db release shop 12             # Give back an unused reservation
//!   bonnie-db purge shop                  # Drop all unused reservations

use anyhow::{Context, Result};
use bonnie_db::{Database, DbConfig, RecordId, TableKind, VERSION};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bonnie-db")]
#[command(about = "Content database tools for BONNIE-32", version = VERSION)]
struct Cli {
    /// Config file (defaults to ./bonnie-db.ron, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database root, overrides the config
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List tables with their ID ranges
    Tables,
    /// Print the IDs in use
    Used { table: TableKind },
    /// Print the next free ID without claiming it
    Find {
        table: TableKind,
        #[arg(long)]
        base: Option<RecordId>,
    },
    /// Claim the next free ID with a placeholder record
    Reserve {
        table: TableKind,
        #[arg(long)]
        base: Option<RecordId>,
    },
    /// Print one record
    Show { table: TableKind, id: RecordId },
    /// Delete a placeholder record
    Release { table: TableKind, id: RecordId },
    /// Delete all placeholder records in a table
    Purge { table: TableKind },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config =
        DbConfig::discover(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    let db = Database::open(config);

    match cli.command {
        Commands::Tables => tables(&db),
        Commands::Used { table } => used(&db, table),
        Commands::Find { table, base } => free_id(&db, table, base, false),
        Commands::Reserve { table, base } => free_id(&db, table, base, true),
        Commands::Show { table, id } => show(&db, table, id),
        Commands::Release { table, id } => release(&db, table, id),
        Commands::Purge { table } => purge(&db, table),
    }
}

fn tables(db: &Database) -> Result<()> {
    println!(
        "{} storage at {}",
        db.mode().label(),
        db.config().root.display()
    );
    for kind in TableKind::ALL {
        let count = db
            .table(kind)
            .used_ids()
            .with_context(|| format!("Failed to list {}", kind))?
            .len();
        println!(
            "{:<20} ids {}..={:<12} {} record(s)",
            kind.dir_name(),
            db.config().base(kind),
            db.config().max_id(kind),
            count
        );
    }
    Ok(())
}

fn used(db: &Database, table: TableKind) -> Result<()> {
    let ids = db
        .table(table)
        .used_ids()
        .with_context(|| format!("Failed to list {}", table))?;
    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

fn free_id(db: &Database, table: TableKind, base: Option<RecordId>, reserve: bool) -> Result<()> {
    let base = base.unwrap_or_else(|| db.config().base(table));
    let id = db.free_id_from(table, base, reserve)?;
    println!("{}", id);
    Ok(())
}

fn show(db: &Database, table: TableKind, id: RecordId) -> Result<()> {
    let record = db
        .table(table)
        .get(id)
        .with_context(|| format!("Failed to read {} {}", table, id))?;

    println!("{} #{}: {}", table, record.id, record.name);
    if record.placeholder {
        println!("  (placeholder)");
    }
    for (name, value) in &record.fields {
        println!("  {} = {}", name, value);
    }
    Ok(())
}

fn release(db: &Database, table: TableKind, id: RecordId) -> Result<()> {
    if db.release(table, id)? {
        println!("Released {} {}", table, id);
    } else {
        println!("{} {} does not exist", table, id);
    }
    Ok(())
}

fn purge(db: &Database, table: TableKind) -> Result<()> {
    let purged = db.purge_placeholders(table)?;
    println!("Purged {} placeholder(s) from {}", purged, table);
    Ok(())
}
