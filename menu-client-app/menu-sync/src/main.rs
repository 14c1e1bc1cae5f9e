mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use menu_core::domain::{into_menu_tree, MenuNode, RootMenu};
use menu_core::services::{BulkStrategy, IncrementalStrategy, MenuService, PersistenceStrategy};
use menu_infrastructure::{create_pool, run_migrations, PgMenuRepository};
use menu_shared::config::AppConfig;
use menu_shared::PersistenceMode;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration; the subscriber is not up yet
    let mut config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(mode) = cli.mode {
        config.sync.mode = mode.into();
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Initialize telemetry; the guard flushes the log file on exit
    let _guard = menu_shared::telemetry::init_telemetry(&config.logging)?;

    info!("{} starting ({})", config.app.name, config.app.env);

    // Connect to Database
    let pool = create_pool(&config.database)
        .await
        .context("connecting to database")?;
    info!("Database connection established.");

    let migrate_only = matches!(cli.command, Commands::Migrate);
    if config.sync.run_migrations || migrate_only {
        run_migrations(&pool).await?;
    }
    if migrate_only {
        info!("Migrations applied");
        return Ok(());
    }

    let repo = Arc::new(PgMenuRepository::new(pool));
    match config.sync.mode {
        PersistenceMode::Incremental => {
            run(MenuService::new(repo, IncrementalStrategy), cli.command).await
        }
        PersistenceMode::Bulk => run(MenuService::new(repo, BulkStrategy), cli.command).await,
    }
}

async fn run<S: PersistenceStrategy>(
    service: MenuService<PgMenuRepository, S>,
    command: Commands,
) -> anyhow::Result<()> {
    match command {
        Commands::Show => print_json(&service.get_menus().await?)?,
        Commands::Plan { file } => {
            let menus = read_submission(&file)?;
            let changes = service.preview(&menus).await?;
            print_json(&changes)?;
        }
        Commands::Apply { file } => {
            let menus = read_submission(&file)?;
            let report = service.change_menus(menus).await.map_err(|e| {
                error!(
                    category = ?e.category(),
                    mode = service.mode().as_str(),
                    "Menu sync failed: {}",
                    e
                );
                e
            })?;
            print_json(&report)?;
        }
        Commands::Remove { id } => {
            service.remove_menu(id).await?;
            info!("Menu {} removed", id);
        }
        Commands::Migrate => {}
    }

    Ok(())
}

fn read_submission(path: &Path) -> anyhow::Result<Vec<RootMenu>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let nodes: Vec<MenuNode> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;

    Ok(into_menu_tree(nodes)?)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
