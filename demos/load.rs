use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;
use tracing::error;

use file_log_sink::init::{init_tracing_with_config, LayerConfig};
use file_log_sink::{FileLogger, LoggerConfig};

#[tokio::main]
async fn main() {
    let dir = std::env::temp_dir().join("file-log-sink-load");
    let logger = Arc::new(FileLogger::new(
        LoggerConfig::builder().directory(&dir).filesize(1024 * 1024).build(),
    ));

    let layer_config = LayerConfig {
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        ..LayerConfig::default()
    };

    let writer = match init_tracing_with_config(logger, layer_config) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("cannot install subscriber: {}", e);
            return;
        }
    };

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!("sent {} events in {:?} (~{:.0} ev/s), files under {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        dir.display(),
    );

    // Give the writer task a little time to drain the channel
    tokio::time::sleep(Duration::from_secs(2)).await;
    writer.abort();
}
