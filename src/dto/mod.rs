/// Health check payloads.
pub mod health;
/// Game server payloads accepted on the ingest routes and websocket.
pub mod ingest;
/// Read-only scoreboard projections.
pub mod public;
/// Server-sent event envelopes.
pub mod sse;
