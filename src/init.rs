use crate::layer::FileLogLayer;
use crate::logger::Logger;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the `tracing` bridge.
///
/// **Fields**
/// - `channel_buffer`: maximum number of [`LogRecord`]s queued before new
///   ones are dropped.
/// - `batch_size`: records handed to the logger per blocking write.
/// - `flush_interval`: longest time a partial batch waits.
/// - `min_level`: least severe `tracing` level that is captured.
/// - `enable_stdout`: also install a `tracing_subscriber::fmt` layer so
///   events show up on the console.
///
/// [`LogRecord`]: crate::record::LogRecord
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub min_level: Level,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            min_level: Level::INFO,
            enable_stdout: false,
        }
    }
}

/// Install a global `tracing` subscriber whose events are written through
/// `logger`.
///
/// Must be called from inside a Tokio runtime. Returns the handle of the
/// background writer task, or an error when a global subscriber is
/// already set.
pub fn init_tracing_with_config(
    logger: Arc<dyn Logger>,
    config: LayerConfig,
) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    let (layer, handle) = FileLogLayer::new(
        logger,
        config.min_level,
        config.channel_buffer,
        config.batch_size,
        config.flush_interval,
    );

    // The two subscriber stacks have different types, so each branch
    // installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(handle)
}

/// [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(logger: Arc<dyn Logger>) -> Result<JoinHandle<()>, SetGlobalDefaultError> {
    init_tracing_with_config(logger, LayerConfig::default())
}
