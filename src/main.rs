use anyhow::Context;
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use taskdeck::config::Config;
use taskdeck::db::{self, AppState};
use taskdeck::handlers;

#[derive(Parser)]
#[command(name = "taskdeck", about = "Multi-tenant task tracking backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the database schema and exit
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taskdeck=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let pool = db::open_pool(&config.database_path)
        .with_context(|| format!("opening database at {}", config.database_path))?;
    {
        let conn = pool.get()?;
        db::init_db(&conn)?;
    }

    if let Some(Command::InitDb) = cli.command {
        tracing::info!(path = %config.database_path, "database initialized");
        return Ok(());
    }

    let state = AppState::new(pool, &config);
    let app = handlers::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("binding {}", config.addr()))?;
    tracing::info!(addr = %config.addr(), "taskdeck listening");
    axum::serve(listener, app).await?;
    Ok(())
}
