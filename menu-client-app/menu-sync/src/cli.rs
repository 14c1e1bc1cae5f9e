//! Command line definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use menu_shared::PersistenceMode;

/// Keep the stored menu tree in step with a submitted one
#[derive(Parser)]
#[command(name = "menu-sync")]
#[command(about = "Synchronize a two-level menu tree with PostgreSQL")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Persistence mode (overrides sync.mode)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Log level (overrides logging.level)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the stored tree as JSON
    Show,
    /// Print the changes a submission would make, without writing
    Plan {
        /// JSON array of menus
        file: PathBuf,
    },
    /// Make storage match a submission
    Apply {
        /// JSON array of menus
        file: PathBuf,
    },
    /// Delete one menu; a main menu takes its sub menus with it
    Remove { id: i64 },
    /// Apply pending database migrations
    Migrate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    Incremental,
    Bulk,
}

impl From<ModeArg> for PersistenceMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Incremental => PersistenceMode::Incremental,
            ModeArg::Bulk => PersistenceMode::Bulk,
        }
    }
}
