use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use sunroom_client::{
    ClientError, JoinError, JoinOptions, PendingJoin, RoomConnector, RoomEvent, RoomHandle,
    TokenClient, VoiceChat,
};
use sunroom_transcript::{TextStream, ATTR_SEGMENT_ID, ATTR_TRANSCRIPTION_FINAL, TRANSCRIPTION_TOPIC};
use sunroom_types::{ConnectionState, MicrophoneState};
use tokio::sync::{mpsc, Notify};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIVEKIT_URL: &str = "wss://example.livekit.cloud";

#[derive(Default)]
struct RoomLog {
    microphone: Mutex<Vec<bool>>,
    disconnected: AtomicBool,
    fail_microphone: AtomicBool,
}

struct FakeRoom {
    log: Arc<RoomLog>,
}

#[async_trait]
impl RoomHandle for FakeRoom {
    async fn set_microphone_enabled(&self, enabled: bool) -> Result<(), ClientError> {
        if self.log.fail_microphone.load(Ordering::SeqCst) {
            return Err(ClientError::Room("no microphone permission".into()));
        }
        self.log.microphone.lock().unwrap().push(enabled);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        self.log.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FakeConnector {
    log: Arc<RoomLog>,
    seen: Mutex<Option<(String, String)>>,
    events: Mutex<Option<mpsc::Sender<RoomEvent>>>,
    refuse: bool,
    // When set, `connect` waits here before answering.
    gate: Option<Arc<Notify>>,
}

impl FakeConnector {
    fn events(&self) -> mpsc::Sender<RoomEvent> {
        self.events.lock().unwrap().clone().expect("not connected")
    }
}

#[async_trait]
impl RoomConnector for FakeConnector {
    type Room = FakeRoom;

    async fn connect(
        &self,
        url: &str,
        token: &str,
    ) -> Result<(FakeRoom, mpsc::Receiver<RoomEvent>), ClientError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.refuse {
            return Err(ClientError::Room("signal connection failed".into()));
        }
        *self.seen.lock().unwrap() = Some((url.to_string(), token.to_string()));
        let (tx, rx) = mpsc::channel(16);
        *self.events.lock().unwrap() = Some(tx);
        Ok((FakeRoom { log: self.log.clone() }, rx))
    }
}

async fn token_server() -> MockServer {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_json(json!({ "room": "sunny-weather", "username": "alice" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-abc" })))
        .mount(&mock_server)
        .await;
    mock_server
}

fn options() -> JoinOptions {
    JoinOptions {
        username: "alice".into(),
        ..JoinOptions::default()
    }
}

fn segment(id: &str, sender: &str, text: &str, is_final: bool) -> RoomEvent {
    RoomEvent::TextStreamReceived(
        TextStream::new(format!("{id}-{text}"), TRANSCRIPTION_TOPIC, sender, text)
            .with_attribute(ATTR_SEGMENT_ID, id)
            .with_attribute(ATTR_TRANSCRIPTION_FINAL, if is_final { "true" } else { "false" }),
    )
}

#[tokio::test]
async fn test_join_fetches_token_and_connects() {
    let server = token_server().await;
    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&server.uri());

    let (chat, _events) = VoiceChat::join(&connector, &tokens, options(), LIVEKIT_URL)
        .await
        .expect("join should succeed");

    assert_eq!(chat.connection_state(), ConnectionState::Connected);
    assert_eq!(chat.microphone_state(), MicrophoneState::Enabled);
    assert_eq!(chat.local_identity(), "alice");
    assert_eq!(
        connector.seen.lock().unwrap().clone(),
        Some((LIVEKIT_URL.to_string(), "jwt-abc".to_string()))
    );
}

#[tokio::test]
async fn test_rejected_token_surfaces_alert() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Server misconfigured" })),
        )
        .mount(&mock_server)
        .await;

    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&mock_server.uri());
    let err = VoiceChat::join(&connector, &tokens, options(), LIVEKIT_URL)
        .await
        .expect_err("join should fail");

    match &err {
        JoinError::Rejected { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "Server misconfigured");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.alert_message(), "Failed to get access token: Server misconfigured");
    assert!(connector.seen.lock().unwrap().is_none(), "must not connect without a token");
}

#[tokio::test]
async fn test_connect_failure_is_join_error() {
    let server = token_server().await;
    let connector = FakeConnector {
        refuse: true,
        ..FakeConnector::default()
    };
    let tokens = TokenClient::new(&server.uri());

    let pending = PendingJoin::new(options()).unwrap();
    let updates = pending.subscribe();
    let err = pending
        .connect(&connector, &tokens, LIVEKIT_URL)
        .await
        .expect_err("join should fail");
    assert!(matches!(err, JoinError::Connect(ClientError::Room(_))));
    assert_eq!(updates.borrow().connection, ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connecting_is_visible_until_room_answers() {
    let server = token_server().await;
    let gate = Arc::new(Notify::new());
    let connector = Arc::new(FakeConnector {
        gate: Some(gate.clone()),
        ..FakeConnector::default()
    });
    let tokens = TokenClient::new(&server.uri());

    let pending = PendingJoin::new(options()).unwrap();
    let mut updates = pending.subscribe();
    assert_eq!(updates.borrow_and_update().connection, ConnectionState::Connecting);
    assert_eq!(updates.borrow().connection.badge_label(), "Connecting…");

    let join = {
        let connector = connector.clone();
        tokio::spawn(async move { pending.connect(&*connector, &tokens, LIVEKIT_URL).await })
    };

    // The connector is parked on the gate, so nothing has moved on yet.
    tokio::task::yield_now().await;
    assert_eq!(updates.borrow().connection, ConnectionState::Connecting);

    gate.notify_one();
    updates
        .wait_for(|view| view.connection == ConnectionState::Connected)
        .await
        .unwrap();

    let (chat, _events) = join.await.unwrap().expect("join should succeed");
    assert_eq!(chat.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_blank_username_rejected_before_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&mock_server.uri());
    let bad = JoinOptions {
        username: "  ".into(),
        ..JoinOptions::default()
    };
    let err = VoiceChat::join(&connector, &tokens, bad, LIVEKIT_URL)
        .await
        .expect_err("join should fail");
    assert!(matches!(err, JoinError::InvalidOptions(_)));
}

#[tokio::test]
async fn test_transcript_follows_text_streams() {
    let server = token_server().await;
    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&server.uri());
    let (chat, _events) = VoiceChat::join(&connector, &tokens, options(), LIVEKIT_URL)
        .await
        .unwrap();

    assert!(chat.handle_event(segment("u1", "alice", "Is it hot today?", true)));
    assert!(chat.handle_event(segment("a1", "agent-77", "Let me", false)));
    assert!(chat.view().is_typing());

    assert!(chat.handle_event(segment("a1", "agent-77", "Let me check the forecast.", true)));
    let view = chat.view();
    assert!(!view.is_typing());

    let lines: Vec<_> = view
        .entries()
        .into_iter()
        .map(|e| format!("{}: {}", e.source.label(), e.text))
        .collect();
    assert_eq!(lines, ["You: Is it hot today?", "Agent: Let me check the forecast."]);

    // Streams on other topics are ignored.
    assert!(chat.handle_event(RoomEvent::TextStreamReceived(TextStream::new(
        "c1", "lk.chat", "bob", "hey"
    ))));
    assert_eq!(chat.view().entries().len(), 2);
}

#[tokio::test]
async fn test_transcript_capacity_is_enforced() {
    let server = token_server().await;
    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&server.uri());
    let opts = JoinOptions {
        transcript_capacity: 2,
        ..options()
    };
    let (chat, _events) = VoiceChat::join(&connector, &tokens, opts, LIVEKIT_URL)
        .await
        .unwrap();

    for i in 0..4 {
        chat.handle_event(segment(&format!("s{i}"), "agent-1", &format!("line {i}"), true));
    }
    let texts: Vec<_> = chat.view().entries().into_iter().map(|e| e.text).collect();
    assert_eq!(texts, ["line 2", "line 3"]);
}

#[tokio::test]
async fn test_connection_badge_and_remote_disconnect() {
    let server = token_server().await;
    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&server.uri());
    let (chat, events) = VoiceChat::join(&connector, &tokens, options(), LIVEKIT_URL)
        .await
        .unwrap();
    let chat = Arc::new(chat);
    let mut updates = chat.subscribe();

    let runner = {
        let chat = chat.clone();
        tokio::spawn(async move { chat.run(events).await })
    };

    let feed = connector.events();
    feed.send(RoomEvent::ConnectionStateChanged(ConnectionState::Reconnecting))
        .await
        .unwrap();
    updates
        .wait_for(|view| view.connection == ConnectionState::Reconnecting)
        .await
        .unwrap();
    assert_eq!(chat.connection_state().badge_label(), "Reconnecting…");

    feed.send(segment("a1", "agent-1", "Hello!", true)).await.unwrap();
    feed.send(RoomEvent::Disconnected {
        reason: Some("room deleted".into()),
    })
    .await
    .unwrap();

    runner.await.unwrap();
    let view = chat.view();
    assert_eq!(view.connection, ConnectionState::Disconnected);
    assert!(view.entries().is_empty(), "transcript is discarded on disconnect");
}

#[tokio::test]
async fn test_microphone_toggle_reaches_room() {
    let server = token_server().await;
    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&server.uri());
    let (chat, _events) = VoiceChat::join(&connector, &tokens, options(), LIVEKIT_URL)
        .await
        .unwrap();

    assert_eq!(chat.toggle_microphone().await.unwrap(), MicrophoneState::Muted);
    assert_eq!(chat.toggle_microphone().await.unwrap(), MicrophoneState::Enabled);
    assert_eq!(*connector.log.microphone.lock().unwrap(), vec![false, true]);

    connector.log.fail_microphone.store(true, Ordering::SeqCst);
    assert!(chat.toggle_microphone().await.is_err());
    assert_eq!(chat.microphone_state(), MicrophoneState::Enabled);
}

#[tokio::test]
async fn test_local_disconnect_clears_session() {
    let server = token_server().await;
    let connector = FakeConnector::default();
    let tokens = TokenClient::new(&server.uri());
    let (chat, _events) = VoiceChat::join(&connector, &tokens, options(), LIVEKIT_URL)
        .await
        .unwrap();

    chat.handle_event(segment("a1", "agent-1", "Hi there", true));
    chat.disconnect().await.unwrap();

    assert!(connector.log.disconnected.load(Ordering::SeqCst));
    assert_eq!(chat.connection_state(), ConnectionState::Disconnected);
    assert!(chat.view().entries().is_empty());

    // The handler is gone: later streams are not recorded.
    chat.handle_event(segment("a2", "agent-1", "still here?", true));
    assert!(chat.view().entries().is_empty());

    assert!(matches!(
        chat.toggle_microphone().await,
        Err(ClientError::NotConnected)
    ));
}
