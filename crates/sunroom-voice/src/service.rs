use crate::config::LiveKitConfig;
use crate::error::VoiceError;
use livekit_api::access_token::{AccessToken, VideoGrants};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TokenService {
    config: LiveKitConfig,
}

impl TokenService {
    pub fn new(config: LiveKitConfig) -> Self {
        Self { config }
    }

    pub fn has_credentials(&self) -> bool {
        self.config.has_credentials()
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.config.token_ttl_seconds)
    }

    /// Mints a join token for `username` in `room`.
    ///
    /// The username doubles as participant identity and display name. The
    /// token may join the room, publish, subscribe and publish data.
    pub fn mint(&self, room: &str, username: &str) -> Result<String, VoiceError> {
        if !self.has_credentials() {
            return Err(VoiceError::MissingCredentials);
        }

        if room.is_empty() || username.is_empty() {
            return Err(VoiceError::InvalidRequest(
                "room and username are required".to_string(),
            ));
        }

        let token = AccessToken::with_api_key(&self.config.api_key, &self.config.api_secret)
            .with_identity(username)
            .with_name(username)
            .with_grants(VideoGrants {
                room_join: true,
                room: room.to_string(),
                can_publish: true,
                can_subscribe: true,
                can_publish_data: true,
                ..Default::default()
            })
            .with_ttl(self.token_ttl());

        let jwt = token.to_jwt()?;
        debug!(room, identity = username, "minted join token");
        Ok(jwt)
    }
}
