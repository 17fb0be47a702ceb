use pyconjp_cron::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting pyconjp-cron");

    // Load configuration
    let config = startup::load_config().await?;

    // Run the schedulers until a termination signal arrives
    startup::run_service(config).await
}
