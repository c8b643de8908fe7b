//! AdSky Panel server

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adsky_panel::{
    routes, spawn_sweeper, AppState, Config, ConsoleEmailSender, EmailSender,
    InMemorySessionStore, InMemoryUserStore, SessionStore, SmtpConfig, SmtpEmailSender,
    SqliteStore, UserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "adsky_panel=debug,adsky_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();
    tracing::info!(?config, "Loaded configuration");

    let email_sender: Box<dyn EmailSender> = match SmtpConfig::from_env() {
        Some(smtp) => {
            tracing::info!(host = %smtp.host, "Sending email over SMTP");
            Box::new(SmtpEmailSender::new(smtp).map_err(anyhow::Error::msg)?)
        }
        None => {
            tracing::info!("SMTP not configured, printing emails to the console");
            Box::new(ConsoleEmailSender::new())
        }
    };

    match config.database.clone() {
        Some(path) => {
            let store = SqliteStore::open(&path)?;
            tracing::info!(%path, "Opened SQLite database");
            serve(config, store.clone(), store, email_sender).await
        }
        None => {
            tracing::warn!("No database configured, accounts live in memory only");
            serve(
                config,
                InMemoryUserStore::new(),
                InMemorySessionStore::new(),
                email_sender,
            )
            .await
        }
    }
}

async fn serve<U, S, E>(config: Config, user_store: U, session_store: S, email_sender: E) -> Result<()>
where
    U: UserStore + 'static,
    S: SessionStore + 'static,
    E: EmailSender + 'static,
{
    let port = config.port;
    let cleanup_every = Duration::from_secs(config.cleanup_interval_seconds);

    let state = Arc::new(AppState::new(config, user_store, session_store, email_sender)?);

    let _sweeper = spawn_sweeper(Arc::clone(&state.tokens), cleanup_every);

    let app = routes::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Panel listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
