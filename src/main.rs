use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use sisu_backend::config::Config;
use sisu_backend::store::{MemoryStore, PgStore, Store};
use sisu_backend::{AppState, app, import};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Event guest-list backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Keep everything in memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
    /// Import a guest CSV file into an event's roster
    Import {
        /// Public event id (event_name_id)
        event: String,
        file: PathBuf,
    },
}

async fn connect(config: &Config) -> Store {
    let db = PgPool::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!()
        .run(&db)
        .await
        .expect("failed to run migrations");

    Store::Postgres(PgStore::new(db))
}

async fn serve(config: Config, in_memory: bool) {
    let store = if in_memory {
        tracing::warn!("using in-memory store, data is lost on exit");
        Store::Memory(MemoryStore::new())
    } else {
        connect(&config).await
    };

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        store,
        config: Arc::new(config),
    };

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app(state)).await.unwrap();
}

async fn import_file(config: Config, event_name_id: &str, file: &Path) -> Result<(), String> {
    let store = connect(&config).await;

    let event = store
        .event_by_name_id(event_name_id)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("event {event_name_id} not found"))?;

    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;

    let outcome = import::import_guests(&store, event.id, &bytes)
        .await
        .map_err(|e| format!("Error processing CSV file: {e}"))?;

    for message in outcome.messages() {
        println!("[{:?}] {}", message.level, message.text);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve { in_memory: false }) {
        Command::Serve { in_memory } => serve(config, in_memory).await,
        Command::Import { event, file } => {
            if let Err(e) = import_file(config, &event, &file).await {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        }
    }
}
