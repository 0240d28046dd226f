use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use game_core::LevelCatalog;
use shared::domain::LevelId;
use storage::{prepare_database_url, Storage, DEFAULT_DATABASE_URL};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = DEFAULT_DATABASE_URL)]
    database_url: String,
    /// Catalog document to check level ids against; the built-in levels otherwise.
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every level with its saved completion state.
    List,
    Complete {
        level_id: u32,
    },
    Reset {
        level_id: u32,
    },
    ResetAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();
    let catalog = match &cli.catalog {
        Some(path) => LevelCatalog::from_path(path)?,
        None => LevelCatalog::builtin(),
    };
    let storage = Storage::new(&prepare_database_url(&cli.database_url)?).await?;

    match cli.command {
        Command::List => {
            let completed = storage.completed_levels().await?;
            for summary in catalog.list() {
                let progress = completed.iter().find(|p| p.level_id == summary.id);
                match progress {
                    Some(p) => println!(
                        "{:>3} {:<12} completed {}",
                        summary.id.0,
                        summary.title,
                        p.completed_at.format("%Y-%m-%d %H:%M")
                    ),
                    None => println!("{:>3} {:<12} locked", summary.id.0, summary.title),
                }
            }
        }
        Command::Complete { level_id } => {
            let level_id = known_level(&catalog, level_id)?;
            storage.mark_level_completed(level_id).await?;
            println!("marked level {level_id} completed");
        }
        Command::Reset { level_id } => {
            let level_id = known_level(&catalog, level_id)?;
            if storage.reset_level(level_id).await? {
                println!("reset level {level_id}");
            } else {
                println!("level {level_id} was not completed");
            }
        }
        Command::ResetAll => {
            let count = storage.reset_all().await?;
            println!("cleared progress for {count} level(s)");
        }
    }

    Ok(())
}

fn known_level(catalog: &LevelCatalog, raw: u32) -> Result<LevelId> {
    let level_id = LevelId(raw);
    if !catalog.contains(level_id) {
        bail!("level {level_id} is not in the catalog");
    }
    Ok(level_id)
}
