use crate::config::Config;
use crate::error::BotResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

// Export components
pub mod calendar_sync;
pub mod sns_notify;

/// Component trait that all components must implement
#[async_trait]
pub trait Component: Send + Sync {
    /// Get the name of the component
    fn name(&self) -> &'static str;

    /// Initialize the component; long-running work must stop when `shutdown` is cancelled
    async fn init(&self, config: Arc<RwLock<Config>>, shutdown: CancellationToken) -> BotResult<()>;

    /// Wait for the component to wind down
    async fn shutdown(&self) -> BotResult<()>;
}

/// Manager for all components
pub struct ComponentManager {
    components: Vec<Box<dyn Component>>,
    config: Arc<RwLock<Config>>,
    shutdown: CancellationToken,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("component_count", &self.components.len())
            .field("config", &self.config)
            .finish()
    }
}

impl ComponentManager {
    /// Create a new component manager
    pub fn new(config: Arc<RwLock<Config>>) -> Self {
        Self {
            components: Vec::new(),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a component
    pub fn register<T: Component + 'static>(&mut self, component: T) {
        info!("Registering component: {}", component.name());
        self.components.push(Box::new(component));
    }

    /// Names of the registered components, in registration order
    pub fn component_names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Initialize all registered components that are enabled in the config
    pub async fn init_all(&self) -> BotResult<usize> {
        let mut started = 0;

        for component in &self.components {
            if !self.config.read().await.is_component_enabled(component.name()) {
                warn!("Component {} is disabled, not starting it", component.name());
                continue;
            }

            info!("Initializing component: {}", component.name());

            if let Err(e) = component
                .init(Arc::clone(&self.config), self.shutdown.child_token())
                .await
            {
                // Log error but continue with other components
                tracing::error!("Error initializing component {}: {:?}", component.name(), e);
            } else {
                started += 1;
            }
        }

        Ok(started)
    }

    /// Shutdown all components
    pub async fn shutdown_all(&self) -> BotResult<()> {
        info!("Shutting down all components");
        self.shutdown.cancel();

        for component in &self.components {
            info!("Shutting down component: {}", component.name());

            if let Err(e) = component.shutdown().await {
                // Log error but continue with other components
                tracing::error!(
                    "Error shutting down component {}: {:?}",
                    component.name(),
                    e
                );
            }
        }

        Ok(())
    }
}
