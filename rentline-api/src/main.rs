use std::net::SocketAddr;

use anyhow::Context;
use axum::{extract::Request, ServiceExt};
use rentline_api::{app, state::{AppState, AuthConfig}};
use rentline_store::{app_config::Config, DbClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rentline_api=debug,rentline_store=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Rentline API on port {}", config.server.port);

    let auth = AuthConfig::from_config(&config);
    let page_size = config.pagination.default_page_size;

    let app_state = if config.database.url.is_empty() {
        tracing::warn!("database.url is empty; using the in-memory store");
        AppState::in_memory(auth, page_size)
    } else {
        let db = DbClient::new(&config.database)
            .await
            .context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        AppState::postgres(&db, auth, page_size)
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
