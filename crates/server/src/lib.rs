pub mod config;
pub mod errors;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

use crate::{
    config::{get_config, AppConfig},
    router::create_router,
    state::build_app_state,
};
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

/// Configures and runs the web server.
///
/// This function initializes the application state, creates the router,
/// and starts the Axum server.
pub async fn run(listener: TcpListener, config: AppConfig) -> anyhow::Result<()> {
    debug!(?config, "Server configuration loaded");

    let app_state = build_app_state(config).await?;
    let app = create_router(app_state);

    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Binds the configured host and port. The host may be a name such as `localhost`.
pub async fn bind_listener(config: &AppConfig) -> anyhow::Result<TcpListener> {
    Ok(TcpListener::bind((config.host.as_str(), config.port)).await?)
}

/// The library's main entry point.
///
/// Sets up logging, configuration, and the TCP listener, then calls `run`.
pub async fn start() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = get_config(None)?;
    let listener = bind_listener(&config).await?;
    info!("Server listening on {}", listener.local_addr()?);

    run(listener, config).await
}
