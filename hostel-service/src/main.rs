use hostel_service::config::HostelConfig;
use hostel_service::services::metrics::init_metrics;
use hostel_service::startup::Application;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics();

    let config = HostelConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| config.common.log_level.clone());
    init_tracing(
        "hostel-service",
        &log_level,
        config.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        environment = %config.common.environment,
        store = config.store.as_str(),
        due_day = config.billing.due_day,
        auto_generate = config.billing.auto_generate,
        "Starting hostel-service"
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
