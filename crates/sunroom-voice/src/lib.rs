//! LiveKit integration for Sunroom.
//!
//! Holds the LiveKit credentials and mints the short-lived join tokens the
//! browser or session client presents when connecting to a room. Media
//! transport itself is handled by the LiveKit platform; nothing here opens a
//! connection to it.

pub mod config;
pub mod error;
pub mod service;

pub use config::{LiveKitConfig, DEFAULT_TOKEN_TTL_SECONDS};
pub use error::VoiceError;
pub use service::TokenService;
