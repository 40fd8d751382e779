use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::VoiceError;

/// Lifetime of minted join tokens: ten minutes.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 600;

fn default_token_ttl_seconds() -> u64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    /// WebSocket URL of the LiveKit deployment the client connects to.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for LiveKit join tokens. Default: 600 (10 minutes).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }

    /// True when both halves of the API key pair are present.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.api_secret.trim().is_empty()
    }

    /// Rejects settings that would produce unusable tokens.
    pub fn validate(&self) -> Result<(), VoiceError> {
        if self.token_ttl_seconds == 0 {
            return Err(VoiceError::Config(
                "token_ttl_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
