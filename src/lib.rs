pub mod api;
pub mod config;
pub mod core_state;
pub mod dashboard;
pub mod db;
pub mod export;
pub mod models;
pub mod report;
pub mod schema;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Database(#[from] db::DatabaseError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Start the register and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let app_config = config::AppConfig::from_env()?;
    let core = Arc::new(core_state::RegisterState::from_config(&app_config));

    // Create and migrate the database up front so a bad path fails here,
    // not on the first request.
    let conn = core.open_db()?;
    let records = db::count_visit_records(&conn)?;
    drop(conn);
    tracing::info!(db = %core.db_path().display(), records, "Database ready");

    let mut server = api::start_server_on(core, app_config.listen_addr).await?;
    tracing::info!(url = %server.url(), "Open the register in a browser");

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    server.shutdown();
    server.wait().await;
    Ok(())
}
