//! Seam between the session and the platform's room client library.
//!
//! The platform client owns audio capture, transport and reconnection. The
//! session only needs three things from it: a way to connect with a token,
//! a stream of room events, and a handle to mute or leave.

use async_trait::async_trait;
use sunroom_transcript::TextStream;
use sunroom_types::ConnectionState;
use tokio::sync::mpsc;

use crate::error::ClientError;

/// Events the room client delivers to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// The platform reported a new connection state.
    ConnectionStateChanged(ConnectionState),
    /// A text stream was fully received.
    TextStreamReceived(TextStream),
    /// The room closed, locally or remotely.
    Disconnected { reason: Option<String> },
}

/// Handle to a connected room.
#[async_trait]
pub trait RoomHandle: Send + Sync {
    /// Enables or mutes the local microphone track.
    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), ClientError>;

    /// Leaves the room.
    async fn disconnect(&self) -> Result<(), ClientError>;
}

/// Opens room connections.
#[async_trait]
pub trait RoomConnector: Send + Sync {
    type Room: RoomHandle;

    /// Connects to `url` with `token`, returning the room and its event feed.
    async fn connect(
        &self,
        url: &str,
        token: &str,
    ) -> Result<(Self::Room, mpsc::Receiver<RoomEvent>), ClientError>;
}
