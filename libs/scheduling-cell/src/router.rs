// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::services::optimizer::SlotOptimizer;

pub fn scheduling_routes(state: Arc<SlotOptimizer>) -> Router {
    Router::new()
        .route("/optimize", post(handlers::optimize_slots))
        .route("/status", get(handlers::optimizer_status))
        .with_state(state)
}
