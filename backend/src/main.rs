use tracing::info;
use tracing_subscriber::EnvFilter;

use vacation_tracker::config::AppConfig;
use vacation_tracker::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Data directory: {}", config.data_dir.display());
    let app_state = initialize_backend(&config).await?;
    let controller = app_state.controller.clone();
    let app = create_router(app_state, config.allowed_origin.clone());

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down");
            }
        })
        .await?;

    controller.shutdown().await;
    Ok(())
}
