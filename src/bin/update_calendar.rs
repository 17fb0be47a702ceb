use chrono::Utc;
use pyconjp_cron::components::calendar_sync::{
    build_reconciler, run_sync_pass, ConnpassClient, GoogleCalendarHandle,
};
use pyconjp_cron::config::Config;
use pyconjp_cron::startup;
use pyconjp_cron::utils::token::TokenManager;
use tracing::info;

/// Mirror the configured connpass series into the calendar once
#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    let config = Config::load()?;
    let source = ConnpassClient::new(&config);
    let reconciler = build_reconciler(&config);
    let calendar = GoogleCalendarHandle::new(&config, TokenManager::new(&config));

    let result = run_sync_pass(&source, &reconciler, &calendar, Utc::now()).await;
    calendar.shutdown().await?;

    let summary = result?;
    info!("Calendar sync finished: {:?}", summary);

    Ok(())
}
