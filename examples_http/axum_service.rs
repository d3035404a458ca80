use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use fieldlog::access_log::AccessLogLayer;
use fieldlog::context::Context;
use fieldlog::logger::Logger;
use fieldlog::registry::keys;

async fn get_order(State(logger): State<Arc<Logger>>, Path(id): Path<String>) -> StatusCode {
    let ctx = Context::new()
        .with_value(keys::ORDER_UID, id.clone())
        .with_field(keys::HANDLER, "get_order");

    if id == "0" {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "order not found");
        logger.error(&ctx, "order lookup failed", &err);
        return StatusCode::NOT_FOUND;
    }

    logger.info(&ctx, "order served");
    StatusCode::OK
}

#[tokio::main]
async fn main() {
    let logger = Arc::new(Logger::from_env());
    logger.registry().register(keys::ORDER_UID);

    let app = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/orders/{id}", get(get_order))
        .layer(AccessLogLayer::new(Arc::clone(&logger)).ignore_paths(["/health"]))
        .with_state(Arc::clone(&logger));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(addr).await.expect("bind");
    println!("listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("serve");

    logger.flush().await;
}
