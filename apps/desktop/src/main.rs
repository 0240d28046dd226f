use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use game_core::SessionController;
use platform_integration::TracingSoundPlayer;
use storage::{prepare_database_url, Storage};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod play;

use config::{load_settings, InterludeMode, DEFAULT_CONFIG_PATH};

#[derive(Parser, Debug)]
#[command(about = "Find every animal on each level; progress is saved between runs")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    catalog: Option<PathBuf>,
    #[arg(long)]
    celebration_delay_ms: Option<u64>,
    #[arg(long)]
    interlude: Option<InterludeMode>,
    /// Play every level in order instead of reading commands from stdin.
    #[arg(long)]
    autoplay: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config);
    if let Some(v) = args.database_url {
        settings.database_url = v;
    }
    if let Some(v) = args.catalog {
        settings.catalog_path = Some(v);
    }
    if let Some(v) = args.celebration_delay_ms {
        settings.celebration_delay_ms = v;
    }
    if let Some(v) = args.interlude {
        settings.interlude = v;
    }

    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url)
        .await
        .context("failed to open progress storage")?;
    let catalog = Arc::new(settings.load_catalog()?);
    info!(
        levels = catalog.len(),
        database_url = %database_url,
        interlude = ?settings.interlude,
        "starting session"
    );

    let handle = SessionController::spawn(
        catalog,
        Arc::new(storage),
        settings.interlude_provider(),
        settings.session_config(),
    );
    let presenter = play::spawn_presenter(handle.subscribe_events(), Arc::new(TracingSoundPlayer));

    if args.autoplay {
        let finished = play::autoplay(&handle).await?;
        info!(last_level = ?finished.level_id, "autoplay finished");
    } else {
        play::interactive(&handle).await?;
    }

    play::close(handle, presenter).await
}
