//! HTTP client for the game server that owns teams, tasks and checker results.

mod client;
mod error;
mod models;

pub use client::UpstreamClient;
pub use error::{UpstreamError, UpstreamResult};
pub use models::{ClientConfig, TeamTaskStateRaw};
