use anyhow::Context;
use stadium_api::{
    app,
    state::{AppState, AuthConfig, Backends, MediaSettings},
};
use stadium_store::{app_config::Config, DbClient, LocalMediaStore, MemoryStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stadium_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting stadium API on port {}", config.server.port);

    let media_root = PathBuf::from(&config.media.root);
    let backends = match config.database.url() {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            Backends::postgres(db.pool, media_root.clone())
        }
        None => {
            tracing::warn!("No database url configured, records are kept in memory only");
            Backends::in_memory(
                Arc::new(MemoryStore::new()),
                Arc::new(LocalMediaStore::new(media_root.clone())),
            )
        }
    };

    let app_state = AppState::new(
        backends,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
        MediaSettings {
            root: media_root,
            base_url: config.media.base_url.clone(),
            max_upload_bytes: config.media.max_upload_bytes,
        },
    );

    if let (Some(username), Some(password)) = (&config.auth.admin_username, &config.auth.admin_password) {
        let email = config.auth.admin_email.as_deref().unwrap_or_default();
        app_state
            .accounts
            .ensure_admin(username, email, password)
            .await
            .context("Failed to provision admin account")?;
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
