//! Session client for the Sunroom voice chat.
//!
//! Models the chat page: nothing connects until [`VoiceChat::join`] (or
//! [`PendingJoin::connect`]) is called. Joining fetches a token from the
//! token server, opens the room through a [`RoomConnector`], and registers
//! a handler for transcription text streams. From then on [`VoiceChat::run`]
//! feeds room events into a [`SessionView`] that carries the connection
//! badge, microphone state, transcript and typing indicator, published over
//! a `watch` channel.
//!
//! The platform's own client library sits behind [`RoomConnector`] and
//! [`RoomHandle`]; audio capture and transport never pass through here.

pub mod error;
pub mod room;
pub mod session;
pub mod token;

pub use error::{ClientError, JoinError};
pub use room::{RoomConnector, RoomEvent, RoomHandle};
pub use session::{JoinOptions, PendingJoin, SessionView, VoiceChat, DEFAULT_ROOM};
pub use token::TokenClient;
