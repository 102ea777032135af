use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

use scheduling_cell::router::scheduling_routes;
use scheduling_cell::services::SlotOptimizer;

pub fn create_router(optimizer: Arc<SlotOptimizer>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Collection scheduler API is running!" }))
        .nest("/scheduling", scheduling_routes(optimizer))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
}
