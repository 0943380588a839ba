use std::sync::Arc;

use anyhow::{Context, Result};
use api::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    api::telemetry::init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        deployment = %config.model.deployment,
        database = %config.database_path.display(),
        uploads = %config.upload_dir.display(),
        "Configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    tracing::info!("Server listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
