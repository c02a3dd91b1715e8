use crate::logger::Logger;
use crate::record::{Context, LogRecord};
use chrono::Utc;
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`Logger`] from a background task.
///
/// Only events at `min_level` or more severe are captured. File I/O runs
/// on Tokio's blocking pool, never on the thread that emitted the event.
pub struct FileLogLayer {
    sender: mpsc::Sender<LogRecord>,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Successfully enqueued into channel.
    pub enqueued_events: Arc<AtomicU64>,
    /// Dropped because the channel was full.
    pub dropped_events: Arc<AtomicU64>,
}

impl FileLogLayer {
    /// Create a new layer and spawn the task that drains its channel into
    /// `logger`.
    ///
    /// Minimal thresholds are enforced for `buffer`, `batch_size` and
    /// `flush_interval` to avoid degenerate configurations. The task exits
    /// after a final flush once the layer is dropped.
    pub fn new(
        logger: Arc<dyn Logger>,
        min_level: Level,
        buffer: usize,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (Self, JoinHandle<()>) {
        let buffer = buffer.max(16);
        let batch_size = batch_size.max(1);
        let flush_interval = flush_interval.max(Duration::from_millis(10));

        let (tx, mut rx) = mpsc::channel::<LogRecord>(buffer);

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);

            loop {
                tokio::select! {
                    received = rx.recv() => match received {
                        Some(record) => {
                            batch.push(record);
                            if batch.len() >= batch_size {
                                write_batch(&logger, &mut batch).await;
                            }
                        }
                        None => {
                            write_batch(&logger, &mut batch).await;
                            break;
                        }
                    },
                    _ = sleep(flush_interval) => {
                        write_batch(&logger, &mut batch).await;
                    }
                }
            }
        });

        (Self {
            sender: tx,
            min_level,
            total_events: Arc::new(AtomicU64::new(0)),
            enqueued_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }, handle)
    }
}

async fn write_batch(logger: &Arc<dyn Logger>, batch: &mut Vec<LogRecord>) {
    if batch.is_empty() {
        return;
    }
    let records = std::mem::take(batch);
    let logger = Arc::clone(logger);
    if let Err(e) = tokio::task::spawn_blocking(move || {
        for record in records {
            logger.log_record(record);
        }
    })
    .await
    {
        eprintln!("log writer task failed: {}", e);
    }
}

/// Severity name used for a `tracing` level.
pub fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warning",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        Level::TRACE => "trace",
    }
}

impl<S> Layer<S> for FileLogLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: LayerContext<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        // `Level` orders ERROR lowest; anything "greater" is less severe.
        // The crate's own diagnostics are never fed back into a logger.
        if *meta.level() > self.min_level || meta.target() == crate::INTERNAL_TARGET {
            return;
        }

        let mut fields = Context::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor { fields: &mut fields, message: &mut message };
        event.record(&mut visitor);
        fields.insert("target".to_string(), serde_json::Value::String(meta.target().to_string()));

        let record = LogRecord::at(
            Utc::now(),
            level_name(meta.level()),
            message.unwrap_or_default(),
            fields,
        );

        match self.sender.try_send(record) {
            Ok(()) => {
                self.enqueued_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(_e) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("log channel full, dropping log record");
            }
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Context,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
