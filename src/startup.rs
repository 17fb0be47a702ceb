use crate::components::{calendar_sync::CalendarSync, sns_notify::SnsNotify, ComponentManager};
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Register every component with the manager
pub fn register_components(component_manager: &mut ComponentManager) {
    component_manager.register(SnsNotify::new());
    component_manager.register(CalendarSync::new());
}

/// Start the schedulers and block until a termination signal
pub async fn run_service(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    register_components(&mut component_manager);

    let started = component_manager.init_all().await?;
    if started == 0 {
        warn!("No components are enabled, nothing to do");
        return Ok(());
    }
    info!("{} components running", started);

    shutdown::wait_for_signal().await?;

    component_manager.shutdown_all().await?;
    info!("All components shut down successfully");

    Ok(())
}
