mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use keendreams_core::{DreamsConfig, env_non_empty};
use keendreams_storage::{DreamRepository, StorageBackend};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keendreams")]
#[command(about = "Dream store for development-session context", long_about = None)]
struct Cli {
    /// `SQLite` database file (overrides `KEENDREAMS_DB_PATH`)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(short, long, default_value = "8787")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Keep dreams in memory instead of the database file
        #[arg(long)]
        in_memory: bool,
    },
    /// Print storage statistics
    Stats,
    /// Keyword search over stored dreams
    Search {
        query: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Delete dreams below the quality threshold
    Cleanup,
    /// Delete dreams repeating a commit of the same project
    Dedup,
    /// Rebuild every project summary from the stored dreams
    RebuildProjects,
}

pub(crate) fn get_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env_non_empty("KEENDREAMS_DB_PATH").map(PathBuf::from)).unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keendreams")
            .join("dreams.db")
    })
}

pub(crate) fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Opens the `SQLite` store at `db_path` and wraps it in a repository.
pub(crate) fn open_repository(db_path: &Path, config: &DreamsConfig) -> Result<Arc<DreamRepository>> {
    ensure_db_dir(db_path)?;
    let backend = StorageBackend::new_sqlite(db_path)?;
    tracing::debug!(path = %db_path.display(), "Opened dream database");
    Ok(Arc::new(DreamRepository::new(backend, config.list_page_size)))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = DreamsConfig::from_env();
    let db_path = get_db_path(cli.db_path);

    match cli.command {
        Commands::Serve { port, host, in_memory } => {
            commands::serve::run(port, host, in_memory, &db_path, &config).await?;
        },
        Commands::Stats => commands::search::run_stats(&db_path, &config).await?,
        Commands::Search { query, limit, project } => {
            commands::search::run_search(&db_path, &config, &query, project.as_deref(), limit)
                .await?;
        },
        Commands::Cleanup => commands::maintenance::run_cleanup(&db_path, &config).await?,
        Commands::Dedup => commands::maintenance::run_dedup(&db_path, &config).await?,
        Commands::RebuildProjects => {
            commands::maintenance::run_rebuild_projects(&db_path, &config).await?;
        },
    }

    Ok(())
}
