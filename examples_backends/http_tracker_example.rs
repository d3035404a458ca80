use std::io;

use fieldlog::context::Context;
use fieldlog::field::Field;
use fieldlog::init::{init_tracing, logger_from_env};
use fieldlog::registry::keys;

/// Ships error reports to the endpoint in `FIELDLOG_TRACKER_ENDPOINT`, e.g.
///
/// ```text
/// FIELDLOG_TRACKER_ENDPOINT=http://127.0.0.1:9000/events \
/// FIELDLOG_TRACKER_ENVIRONMENT=dev FIELDLOG_LEVEL=DEBUG \
///     cargo run --example http_tracker
/// ```
#[tokio::main]
async fn main() {
    let logger = logger_from_env().expect("logger config");
    logger.registry().register(keys::USER_ID);

    // Library `tracing::error!` events are reported too.
    init_tracing(logger.bridge().clone());

    let ctx = Context::new()
        .with_value(keys::USER_ID, "42".to_string())
        .with_field(keys::HANDLER, "login");

    logger.debug(&ctx, "checking credentials");
    logger.warn_with(&ctx, "password attempt", &Field::pairs(&["attempt", "3"]));

    let err = io::Error::new(io::ErrorKind::PermissionDenied, "invalid password");
    logger.error(&ctx, "authentication failed", &err);
    logger.send_error(&ctx, &err, &Field::pairs(&["source", "audit"]));

    tracing::error!(component = "session-store", "session store unreachable");

    logger.flush().await;
}
