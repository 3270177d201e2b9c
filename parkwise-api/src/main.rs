use std::net::SocketAddr;

use anyhow::Context;
use parkwise_api::{app, state::{AppState, AuthConfig}};
use parkwise_core::model::{NewUser, Role};
use parkwise_store::{app_config::Config, DbClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parkwise_api=debug,parkwise_store=info,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Parkwise API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;

    let app_state = AppState::new(
        &db,
        AuthConfig {
            secret: config.auth.jwt_secret.into_inner(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    let bootstrap = config.bootstrap;
    app_state
        .users
        .ensure_admin(&NewUser {
            username: bootstrap.admin_username,
            email: bootstrap.admin_email,
            password: bootstrap.admin_password,
            role: Role::Admin,
        })
        .await
        .context("Failed to create default admin")?;

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
