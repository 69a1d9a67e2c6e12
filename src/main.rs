use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trackpulse_server::music_store::SqliteMusicStore;
use trackpulse_server::server::{run_server, RequestsLoggingLevel};
use trackpulse_server::user::{seed_initial_data, SqliteUserStore, UserManager};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite music store database file.
    #[clap(value_parser = parse_path)]
    pub store_db: PathBuf,

    /// Path to the SQLite database file to use for user storage.
    #[clap(value_parser = parse_path)]
    pub user_db: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Number of read-only connections kept in the store's pool.
    #[clap(long, default_value_t = 4)]
    pub read_pool_size: usize,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Seed permissions, role grants and the bootstrap admin account.
    #[clap(long, default_value_t = false)]
    pub seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "Opening SQLite music store database at {:?}...",
        cli_args.store_db
    );
    let music_store = SqliteMusicStore::new(&cli_args.store_db, cli_args.read_pool_size)?;

    let user_store = SqliteUserStore::new(&cli_args.user_db)?;
    let user_manager = UserManager::new(Box::new(user_store));

    if cli_args.seed {
        info!("Seeding permissions, role grants and bootstrap admin...");
        seed_initial_data(&user_manager)?;
    }

    info!("Starting server on port {}...", cli_args.port);
    run_server(
        music_store,
        user_manager,
        cli_args.logging_level,
        cli_args.port,
        cli_args.frontend_dir_path,
    )
    .await
}
