use std::{sync::Arc, time::Duration};

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{dto::ingest::InitPayload, state::models::TeamId};

use super::{
    error::{UpstreamError, UpstreamResult},
    models::{ClientConfig, TeamTaskStateRaw},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Thin read-only client over the game server REST API.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Arc<str>,
}

impl UpstreamClient {
    /// Build a client rooted at the game server origin (e.g. `http://10.10.10.10:8080`).
    pub fn new(base_url: &str) -> UpstreamResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| UpstreamError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        })
    }

    /// Origin this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full scoreboard snapshot, same shape as the `init_scoreboard` event.
    pub async fn fetch_init(&self) -> UpstreamResult<InitPayload> {
        self.get_json("api/scoreboard/init").await
    }

    /// Public game configuration (round duration).
    pub async fn fetch_client_config(&self) -> UpstreamResult<ClientConfig> {
        self.get_json("api/client/config/").await
    }

    /// Every recorded state of a team's tasks.
    pub async fn fetch_team_states(&self, team_id: TeamId) -> UpstreamResult<Vec<TeamTaskStateRaw>> {
        self.get_json(&format!("api/client/teams/{team_id}/")).await
    }

    async fn get_json<T>(&self, path: &str) -> UpstreamResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| UpstreamError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => {
                response
                    .json::<T>()
                    .await
                    .map_err(|source| UpstreamError::DecodeResponse {
                        path: path.to_string(),
                        source,
                    })
            }
            status => Err(UpstreamError::RequestStatus {
                path: path.to_string(),
                status,
            }),
        }
    }
}
