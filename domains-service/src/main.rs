use domains_service::{config::DomainsConfig, Application};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = DomainsConfig::from_env()?;

    init_tracing(&config.authz.service_name, &config.authz.log_level);

    tracing::info!(
        service = %config.authz.service_name,
        environment = ?config.authz.environment,
        "Starting domains service"
    );

    let _app = Application::in_memory(&config)?;
    tracing::info!("Domains service ready");

    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping domains service");
    Ok(())
}
