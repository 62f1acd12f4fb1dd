use anyhow::Context;

use crate::app::{app, AppState};
use crate::config;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    if let Some(port) = port {
        config.server.port = port;
    }

    if crate::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }

    tokio::fs::create_dir_all(&config.storage.upload_dir)
        .await
        .with_context(|| format!("creating upload dir {}", config.storage.upload_dir.display()))?;

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::from_config(config).await?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Students API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
