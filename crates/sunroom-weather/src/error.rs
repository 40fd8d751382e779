use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("weather API key is not configured")]
    MissingApiKey,

    #[error("weather request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("weather service returned status {0}")]
    Status(u16),

    #[error("weather response missing field: {0}")]
    MissingField(&'static str),
}
