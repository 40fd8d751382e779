use std::sync::{Arc, Mutex, MutexGuard};

use sunroom_transcript::{
    StreamSubscription, TextStreamRegistry, Transcript, DEFAULT_TRANSCRIPT_CAPACITY,
    TRANSCRIPTION_TOPIC,
};
use sunroom_types::{ConnectionState, MicrophoneState, TranscriptEntry};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{ClientError, JoinError};
use crate::room::{RoomConnector, RoomEvent, RoomHandle};
use crate::token::TokenClient;

/// Room joined when the caller does not pick one.
pub const DEFAULT_ROOM: &str = "sunny-weather";

/// What to join and as whom.
#[derive(Debug, Clone)]
pub struct JoinOptions {
    pub room: String,
    pub username: String,
    /// Maximum number of transcript lines kept.
    pub transcript_capacity: usize,
}

impl Default for JoinOptions {
    fn default() -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            room: DEFAULT_ROOM.to_string(),
            username: format!("user-{}", &suffix[..8]),
            transcript_capacity: DEFAULT_TRANSCRIPT_CAPACITY,
        }
    }
}

impl JoinOptions {
    pub fn validate(&self) -> Result<(), JoinError> {
        if self.room.trim().is_empty() {
            return Err(JoinError::InvalidOptions("room must not be empty".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(JoinError::InvalidOptions(
                "username must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Snapshot of everything the chat view renders.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub room: String,
    pub connection: ConnectionState,
    pub microphone: MicrophoneState,
    pub transcript: Transcript,
}

impl SessionView {
    /// Whether the typing indicator should show.
    pub fn is_typing(&self) -> bool {
        self.transcript.is_remote_typing()
    }

    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.transcript.to_vec()
    }
}

/// A joined voice chat session.
///
/// Every method takes `&self`, so the session can be shared between the task
/// pumping room events and whatever drives the mute and leave controls.
pub struct VoiceChat<R: RoomHandle> {
    room: R,
    local_identity: String,
    view: Arc<watch::Sender<SessionView>>,
    registry: TextStreamRegistry,
    // Held only while connected; never locked across an `.await`.
    subscription: Mutex<Option<StreamSubscription>>,
}

impl<R: RoomHandle> std::fmt::Debug for VoiceChat<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceChat")
            .field("local_identity", &self.local_identity)
            .field("connection", &self.connection_state())
            .finish()
    }
}

/// A join that has been validated but not yet connected.
///
/// The view channel exists from this point on, so a caller that subscribes
/// before [`PendingJoin::connect`] sees the session go from `Connecting` to
/// `Connected` (or back to `Disconnected` if the join fails).
#[derive(Debug)]
pub struct PendingJoin {
    options: JoinOptions,
    view: Arc<watch::Sender<SessionView>>,
}

impl PendingJoin {
    /// Validates `options` and publishes a `Connecting` view.
    pub fn new(options: JoinOptions) -> Result<Self, JoinError> {
        options.validate()?;
        let transcript = Transcript::new(options.transcript_capacity)?;

        let (tx, _) = watch::channel(SessionView {
            room: options.room.clone(),
            connection: ConnectionState::Connecting,
            microphone: MicrophoneState::Enabled,
            transcript,
        });
        Ok(Self {
            options,
            view: Arc::new(tx),
        })
    }

    /// Receives view updates, starting with the `Connecting` snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    /// Fetches a token, connects, and starts listening for transcriptions.
    ///
    /// Returns the session and the room's event feed; pass the feed to
    /// [`VoiceChat::run`]. Any failure is a [`JoinError`] for the caller to
    /// alert on.
    pub async fn connect<C>(
        self,
        connector: &C,
        tokens: &TokenClient,
        server_url: &str,
    ) -> Result<(VoiceChat<C::Room>, mpsc::Receiver<RoomEvent>), JoinError>
    where
        C: RoomConnector,
    {
        let view = self.view.clone();
        let result = self.establish(connector, tokens, server_url).await;
        if result.is_err() {
            view.send_modify(|view| view.connection = ConnectionState::Disconnected);
        }
        result
    }

    async fn establish<C>(
        self,
        connector: &C,
        tokens: &TokenClient,
        server_url: &str,
    ) -> Result<(VoiceChat<C::Room>, mpsc::Receiver<RoomEvent>), JoinError>
    where
        C: RoomConnector,
    {
        let Self { options, view } = self;

        info!(room = %options.room, username = %options.username, "joining room");
        let token = tokens.fetch(&options.room, &options.username).await?;
        let (room, events) = connector
            .connect(server_url, &token)
            .await
            .map_err(JoinError::Connect)?;

        let chat = VoiceChat {
            room,
            local_identity: options.username,
            view,
            registry: TextStreamRegistry::new(),
            subscription: Mutex::new(None),
        };
        chat.register_transcription()?;
        chat.view
            .send_modify(|view| view.connection = ConnectionState::Connected);
        info!(room = %options.room, "joined room");

        Ok((chat, events))
    }
}

impl<R: RoomHandle> VoiceChat<R> {
    /// Validates, fetches a token and connects in one step.
    ///
    /// Use [`PendingJoin`] to watch the view while the join is in flight.
    pub async fn join<C>(
        connector: &C,
        tokens: &TokenClient,
        options: JoinOptions,
        server_url: &str,
    ) -> Result<(Self, mpsc::Receiver<RoomEvent>), JoinError>
    where
        C: RoomConnector<Room = R>,
    {
        PendingJoin::new(options)?
            .connect(connector, tokens, server_url)
            .await
    }

    fn register_transcription(&self) -> Result<(), JoinError> {
        let view = self.view.clone();
        let identity = self.local_identity.clone();
        let subscription = self.registry.register(TRANSCRIPTION_TOPIC, move |stream| {
            let entry = stream.to_entry(&identity);
            view.send_modify(|view| {
                view.transcript.apply(entry);
            });
        })?;
        *self.subscription_slot() = Some(subscription);
        Ok(())
    }

    fn subscription_slot(&self) -> MutexGuard<'_, Option<StreamSubscription>> {
        match self.subscription.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("subscription lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Receives view updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.view.borrow().connection
    }

    pub fn microphone_state(&self) -> MicrophoneState {
        self.view.borrow().microphone
    }

    pub fn local_identity(&self) -> &str {
        &self.local_identity
    }

    /// Drops the transcript, unregisters the handler and marks the session
    /// disconnected.
    fn teardown(&self) {
        self.subscription_slot().take();
        self.view.send_modify(|view| {
            view.connection = ConnectionState::Disconnected;
            view.transcript.clear();
        });
    }

    /// Applies one room event. Returns `false` once the session has ended.
    pub fn handle_event(&self, event: RoomEvent) -> bool {
        match event {
            RoomEvent::ConnectionStateChanged(ConnectionState::Disconnected) => {
                info!("room connection closed");
                self.teardown();
                false
            }
            RoomEvent::ConnectionStateChanged(state) => {
                debug!(state = state.badge_label(), "connection state changed");
                self.view.send_modify(|view| view.connection = state);
                true
            }
            RoomEvent::TextStreamReceived(stream) => {
                self.registry.dispatch(&stream);
                true
            }
            RoomEvent::Disconnected { reason } => {
                info!(reason = reason.as_deref().unwrap_or("none"), "disconnected from room");
                self.teardown();
                false
            }
        }
    }

    /// Pumps room events until the room disconnects or the feed closes.
    pub async fn run(&self, mut events: mpsc::Receiver<RoomEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle_event(event) {
                return;
            }
        }
        warn!("room event feed closed without a disconnect event");
        self.teardown();
    }

    /// Mutes or unmutes the microphone. Returns the new state.
    pub async fn toggle_microphone(&self) -> Result<MicrophoneState, ClientError> {
        let (connection, current) = {
            let view = self.view.borrow();
            (view.connection, view.microphone)
        };
        if connection == ConnectionState::Disconnected {
            return Err(ClientError::NotConnected);
        }

        let next = current.toggled();
        self.room.set_microphone_enabled(next.is_enabled()).await?;
        self.view.send_modify(|view| view.microphone = next);
        debug!(microphone = next.control_label(), "microphone toggled");
        Ok(next)
    }

    /// Leaves the room. The local session is torn down even when the room
    /// client reports an error.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        if self.connection_state() == ConnectionState::Disconnected {
            return Ok(());
        }
        let result = self.room.disconnect().await;
        self.teardown();
        if let Err(e) = &result {
            warn!("room disconnect reported an error: {}", e);
        }
        result
    }
}
