use anyhow::Result;
use hotelhub_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus_handle = telemetry::init(&config.telemetry)?;

    info!(
        environment = %config.environment,
        addr = %config.http_addr(),
        "Starting HotelHub Core"
    );

    server::run(config, prometheus_handle).await
}
