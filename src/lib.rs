pub mod adapters;
pub mod alerts;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod notifications;
pub mod ports;
pub mod realtime;
pub mod state;
pub mod types;

pub use app::app;

use crate::notifications::RetentionSweeper;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid auth configuration: {0}")]
    Auth(#[from] auth::AuthError),
    #[error("failed to open record store: {0}")]
    Store(#[from] error::StoreError),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

pub async fn serve(config: config::AppConfig) -> Result<(), StartupError> {
    let state = state::AppState::build(config)?;
    let sweeper = RetentionSweeper::new(
        state.notifications.clone(),
        adapters::TokioTimeProvider,
        state.config.retention_sweep_interval,
    )
    .spawn();
    let fan_out_worker = state.fan_out_worker.clone();

    let listener = tokio::net::TcpListener::bind(state.config.bind).await?;
    tracing::info!(
        addr = %state.config.bind,
        app = %state.config.app_name,
        persisted = state.config.data_file.is_some(),
        "listening"
    );
    let result = axum::serve(listener, app(state)).await;
    sweeper.abort();
    fan_out_worker.abort();
    Ok(result?)
}
