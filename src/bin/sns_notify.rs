use chrono::Utc;
use pyconjp_cron::components::sns_notify::{build_job, notifications::run_notify_pass};
use pyconjp_cron::config::Config;
use pyconjp_cron::error::other_error;
use pyconjp_cron::startup;
use pyconjp_cron::utils::time::current_tick;
use tracing::info;

/// Run a single notify pass for the current tick, for use from cron
#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    let config = Config::load()?;
    let job = build_job(&config);

    // Cron starts us a little after the tick; evaluate at the tick itself
    let now = Utc::now().with_timezone(&config.tz()?).naive_local();
    let tick = current_tick(&now, job.matcher.config().interval_minutes)
        .ok_or_else(|| other_error(&format!("Failed to align {} to a tick", now)))?;

    let summary = run_notify_pass(job.source.as_ref(), &job.matcher, &job.senders, tick).await?;
    info!("Notify pass at {} finished: {:?}", tick, summary);

    Ok(())
}
