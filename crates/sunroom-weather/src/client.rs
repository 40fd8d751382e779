use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::error::WeatherError;

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";
pub const DEFAULT_CITY: &str = "San Ramon";
pub const DEFAULT_STATE: &str = "CA";

/// HTTP timeout for the weather lookup. The reply is spoken mid-conversation,
/// so a slow answer is worse than the fallback.
const FETCH_TIMEOUT: Duration = Duration::from_secs(8);

const NO_KEY_REPLY: &str = "I'm sorry, I don't have access to live weather data right now, \
     but San Ramon typically enjoys a Mediterranean climate with warm, dry summers and mild winters!";

/// The service answered with a non-success status.
const REJECTED_REPLY: &str = "I'm having trouble accessing the weather data right now, \
     but San Ramon usually has beautiful weather!";

/// Transport failure or an unreadable body.
const UNAVAILABLE_REPLY: &str = "I'm having trouble getting the latest weather data, \
     but San Ramon typically has wonderful Mediterranean weather!";

const LOCAL_FLAVOR: &str = "As someone who's lived in San Ramon for years, I can tell you this \
     is pretty typical for our area!\nWe're blessed with great weather year-round here in the East Bay.";

/// Current conditions for one location, in imperial units.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditions {
    pub city: String,
    pub state: String,
    pub temperature_f: f64,
    pub feels_like_f: f64,
    pub humidity_pct: u8,
    pub description: String,
    pub wind_mph: f64,
}

impl Conditions {
    /// Spoken-style report of these conditions.
    pub fn report(&self) -> String {
        format!(
            "Here's the current weather in {}, {}:\n\n\
             🌡️ Temperature: {}°F (feels like {}°F)\n\
             🌤️ Conditions: {}\n\
             💧 Humidity: {}%\n\
             💨 Wind Speed: {} mph\n\n\
             {}",
            self.city,
            self.state,
            self.temperature_f,
            self.feels_like_f,
            title_case(&self.description),
            self.humidity_pct,
            self.wind_mph,
            LOCAL_FLAVOR,
        )
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Deserialize)]
struct ApiResponse {
    main: ApiMain,
    #[serde(default)]
    weather: Vec<ApiWeather>,
    wind: ApiWind,
}

#[derive(Deserialize)]
struct ApiMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Deserialize)]
struct ApiWeather {
    description: String,
}

#[derive(Deserialize)]
struct ApiWind {
    speed: f64,
}

#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl fmt::Debug for WeatherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl WeatherClient {
    /// Creates a client. A blank key counts as no key.
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("OpenWeather API key not found, weather replies will use fallbacks");
        }

        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("failed to build weather HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self {
            http,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Reads the key from `OPENWEATHER_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(std::env::var("OPENWEATHER_API_KEY").ok())
    }

    /// Points the client at another host (used against mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetches current conditions for a US city.
    pub async fn fetch_conditions(&self, city: &str, state: &str) -> Result<Conditions, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;

        let url = format!("{}/data/2.5/weather", self.base_url);
        let location = format!("{},{},US", city, state);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("q", location.as_str()),
                ("appid", api_key),
                ("units", "imperial"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body: ApiResponse = response.json().await?;
        let description = body
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or(WeatherError::MissingField("weather[0].description"))?;

        Ok(Conditions {
            city: city.to_string(),
            state: state.to_string(),
            temperature_f: body.main.temp,
            feels_like_f: body.main.feels_like,
            humidity_pct: body.main.humidity,
            description,
            wind_mph: body.wind.speed,
        })
    }

    /// Spoken answer for the weather tool. Never fails.
    pub async fn current_weather(&self, city: &str, state: &str) -> String {
        match self.fetch_conditions(city, state).await {
            Ok(conditions) => conditions.report(),
            Err(WeatherError::MissingApiKey) => NO_KEY_REPLY.to_string(),
            Err(WeatherError::Status(status)) => {
                debug!(city, state, status, "weather service rejected the lookup");
                REJECTED_REPLY.to_string()
            }
            Err(e) => {
                error!(city, state, "weather lookup failed: {}", e);
                UNAVAILABLE_REPLY.to_string()
            }
        }
    }
}
