/// Read-only client for the game server REST API.
pub mod upstream;
