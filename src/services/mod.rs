/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Applies game server payloads to the shared containers.
pub mod ingest_service;
/// Public service for read-only scoreboard information.
pub mod public_service;
/// Periodic full re-fetch from the game server.
pub mod resync_supervisor;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Ingest WebSocket connection handling.
pub mod websocket_service;
