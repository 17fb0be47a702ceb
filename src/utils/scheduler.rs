use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::BotResult;

/// Trait for component schedulers that run a pass on a fixed cadence
pub trait Scheduler: Send + 'static {
    /// The collaborators one pass needs
    type Handle: Clone + Send + Sync + 'static;

    /// Start the scheduler loop; it returns once `shutdown` is cancelled
    fn start(
        config: Arc<RwLock<Config>>,
        handle: Self::Handle,
        shutdown: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = BotResult<()>> + Send>>;
}
