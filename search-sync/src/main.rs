use std::env;

use search_sync::{Dependencies, ServiceError, Settings};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run() -> Result<(), ServiceError> {
    let settings = Settings::from_env()?;
    let deps = Dependencies::new(&settings).await?;

    let report = deps.health.check().await;
    if report.is_healthy() {
        info!("Dependencies healthy");
    } else {
        warn!(details = ?report.details, "Dependencies reported unhealthy");
    }

    deps.orchestrator.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting search sync service");

    if let Err(e) = run().await {
        error!(error = %e, "Search sync service failed");
        std::process::exit(1);
    }

    info!("Search sync service stopped");
}
