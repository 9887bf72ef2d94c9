//! HTTP routes.

pub mod batch;
mod extractors;
pub mod health;
pub mod sentiment;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(sentiment::router())
                .merge(batch::router()),
        )
        .with_state(state)
}
