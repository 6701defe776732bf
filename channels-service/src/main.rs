use channels_service::{config::ChannelsConfig, Application};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = ChannelsConfig::from_env()?;

    init_tracing(&config.authz.service_name, &config.authz.log_level);

    tracing::info!(
        service = %config.authz.service_name,
        environment = ?config.authz.environment,
        policy_timeout_ms = config.authz.policy.timeout_ms,
        "Starting channels service"
    );

    let _app = Application::in_memory(&config)?;

    signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    Ok(())
}
