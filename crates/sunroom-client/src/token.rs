use std::time::Duration;

use sunroom_types::{ErrorBody, TokenRequest, TokenResponse};
use tracing::{info, warn};

use crate::error::JoinError;

/// Timeout for the token request.
const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the `POST /api/token` route.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TokenClient {
    /// `base_url` is the origin of the token server, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("failed to build token HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self {
            http,
            endpoint: format!("{}/api/token", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Requests a join token for `username` in `room`.
    pub async fn fetch(&self, room: &str, username: &str) -> Result<String, JoinError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&TokenRequest::new(room, username))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            warn!(status = status.as_u16(), %message, "token request rejected");
            return Err(JoinError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = response.json().await?;
        info!(room, username, "received join token");
        Ok(body.token)
    }
}
