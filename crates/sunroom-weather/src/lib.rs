//! Current-conditions lookup for the weather assistant.
//!
//! The assistant exposes a single tool, `get_current_weather`, backed by the
//! OpenWeather current weather endpoint. Replies are meant to be spoken, so
//! [`WeatherClient::current_weather`] never fails: when the API key is absent
//! or the service misbehaves it answers with a friendly fallback line
//! instead.

mod client;
mod error;
mod tool;

pub use client::{Conditions, WeatherClient, DEFAULT_BASE_URL, DEFAULT_CITY, DEFAULT_STATE};
pub use error::WeatherError;
pub use tool::{tool_definition, WeatherToolArgs, TOOL_NAME};
