use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::{WeatherClient, DEFAULT_CITY, DEFAULT_STATE};

/// Name under which the lookup is offered to the language model.
pub const TOOL_NAME: &str = "get_current_weather";

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

fn default_state() -> String {
    DEFAULT_STATE.to_string()
}

/// Arguments of a `get_current_weather` call. Missing fields fall back to
/// San Ramon, CA.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherToolArgs {
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_state")]
    pub state: String,
}

impl Default for WeatherToolArgs {
    fn default() -> Self {
        Self {
            city: default_city(),
            state: default_state(),
        }
    }
}

impl WeatherToolArgs {
    /// Parses raw tool-call arguments; malformed input uses the defaults.
    pub fn from_arguments(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!("malformed {} arguments, using defaults: {}", TOOL_NAME, e);
            Self::default()
        })
    }

    pub async fn invoke(&self, client: &WeatherClient) -> String {
        client.current_weather(&self.city, &self.state).await
    }
}

/// Function declaration for the weather tool, in the JSON-schema shape
/// chat-completion APIs accept.
pub fn tool_definition() -> Value {
    json!({
        "type": "function",
        "function": {
            "name": TOOL_NAME,
            "description": "Get the current weather conditions for a specified city and state",
            "parameters": {
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name",
                        "default": DEFAULT_CITY
                    },
                    "state": {
                        "type": "string",
                        "description": "Two-letter US state code",
                        "default": DEFAULT_STATE
                    }
                },
                "required": []
            }
        }
    })
}
