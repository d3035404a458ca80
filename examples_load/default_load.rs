use std::sync::Arc;
use std::time::Instant;

use fieldlog::context::Context;
use fieldlog::field::Field;
use fieldlog::level::Level;
use fieldlog::logger::{Logger, LoggerConfig};
use fieldlog::noop_sink::NoopSink;
use fieldlog::registry::{keys, FieldRegistry};

#[tokio::main]
async fn main() {
    let registry = FieldRegistry::with_keys([keys::TRACE_ID, keys::USER_ID]);
    let logger = Logger::new(
        LoggerConfig::new(Level::Info).with_registry(registry),
        Arc::new(NoopSink),
    );

    let ctx = Context::new()
        .with_value(keys::TRACE_ID, "trace-1".to_string())
        .with_value(keys::USER_ID, "user-1".to_string())
        .with_field(keys::HANDLER, "load")
        .with_field("region", "eu-west");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let iteration = i.to_string();
        logger.info_with(&ctx, "default load test record", &Field::pairs(&["iteration", iteration.as_str()]));
    }

    let elapsed = start.elapsed();
    println!("merged and wrote {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Suppressed records are never merged; this measures the level check alone.
    let start = Instant::now();
    for _ in 0..n {
        logger.debug(&ctx, "suppressed");
    }
    println!("skipped {} debug records in {:?}", n, start.elapsed());

    logger.flush().await;
}
