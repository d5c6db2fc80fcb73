use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod ingest;
pub mod public;
pub mod sse;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(public::router())
        .merge(sse::router())
        .merge(ingest::router(state.clone()))
        .merge(docs::router())
        .with_state(state)
}
