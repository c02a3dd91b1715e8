use serde_json::json;
use std::sync::Arc;

use file_log_sink::{Context, FileLogger, Logger, LoggerAware, LoggerConfig};

/// A component that logs through whatever logger it was handed.
struct Checkout {
    log: LoggerAware,
}

impl Checkout {
    fn pay(&self, order: u64, card_token: &str) {
        let mut ctx = Context::new();
        ctx.insert("order".into(), json!(order));
        ctx.insert("token".into(), json!(card_token));
        self.log.error(json!("payment declined"), ctx);
    }
}

fn main() {
    let dir = std::env::temp_dir().join("file-log-sink-demo");
    let config = LoggerConfig::builder()
        .directory(&dir)
        .postfix("checkout")
        .filesize(64 * 1024)
        .build();

    let logger = Arc::new(FileLogger::new(config));
    let live = logger.live_path("error");

    let checkout = Checkout { log: LoggerAware::new(logger.clone()) };
    for order in 0..10 {
        checkout.pay(order, "tok_4242424242");
    }

    logger.log_custom("cache_miss", vec![json!("price:sku-1"), json!(3)]);
    logger.info(json!({"event": "shutdown", "clean": true}), Context::new());

    match live {
        Ok(path) => println!("errors written to {}", path.display()),
        Err(e) => println!("no log file: {}", e),
    }
}
