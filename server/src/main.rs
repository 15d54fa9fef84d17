//! yamdb-server: runs the HTTP API, applies migrations, or bootstraps an admin.
//!
//! Configuration comes from the environment (a `.env` file is honoured).

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use yamdb_api::{
    apply_migrations, build_router, connect, ensure_database_exists, service::UserService, AppState,
    Settings,
};

#[derive(Parser)]
#[command(name = "yamdb-server")]
#[command(about = "YaMDb review API server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Migrate and serve the API (default)
    Serve,
    /// Create missing tables and indexes, then exit
    Migrate,
    /// Create an admin account, or promote an existing username
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("yamdb_api=info,yamdb_server=info,tower_http=info")
            }),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    ensure_database_exists(&settings.database_url).await?;
    let pool = connect(&settings).await?;
    apply_migrations(&pool).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::CreateSuperuser { username, email } => {
            let user = UserService::create_superuser(&pool, &username, &email).await?;
            tracing::info!(username = %user.username, id = user.id, "superuser ready");
        }
        Command::Serve => {
            let bind_addr = settings.bind_addr;
            let app = build_router(AppState::new(pool, settings));
            let listener = TcpListener::bind(bind_addr).await?;
            tracing::info!("yamdb-server listening on http://{}", listener.local_addr()?);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires. A listener that fails to install never resolves,
/// so the server keeps running instead of stopping at once.
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
