use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sunroom_transcript::{
    TextStream, TextStreamRegistry, Transcript, TranscriptError, ATTR_SEGMENT_ID,
    ATTR_TRANSCRIPTION_FINAL, TRANSCRIPTION_TOPIC,
};
use sunroom_types::TranscriptSource;

fn segment(id: &str, sender: &str, text: &str, is_final: bool) -> TextStream {
    TextStream::new(format!("stream-{id}-{text}"), TRANSCRIPTION_TOPIC, sender, text)
        .with_attribute(ATTR_SEGMENT_ID, id)
        .with_attribute(ATTR_TRANSCRIPTION_FINAL, if is_final { "true" } else { "false" })
}

#[test]
fn test_duplicate_registration_rejected() {
    let registry = TextStreamRegistry::new();
    let _first = registry.register(TRANSCRIPTION_TOPIC, |_| {}).unwrap();

    let second = registry.register(TRANSCRIPTION_TOPIC, |_| {});
    assert!(matches!(
        second,
        Err(TranscriptError::AlreadyRegistered(topic)) if topic == TRANSCRIPTION_TOPIC
    ));
}

#[test]
fn test_dropping_subscription_unregisters() {
    let registry = TextStreamRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let subscription = registry
        .register(TRANSCRIPTION_TOPIC, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert_eq!(subscription.topic(), TRANSCRIPTION_TOPIC);

    assert!(registry.dispatch(&segment("s1", "agent-1", "hi", true)));
    drop(subscription);

    assert!(!registry.is_registered(TRANSCRIPTION_TOPIC));
    assert!(!registry.dispatch(&segment("s2", "agent-1", "hi", true)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The topic is free again.
    let _again = registry.register(TRANSCRIPTION_TOPIC, |_| {}).unwrap();
}

#[test]
fn test_guard_tolerates_manual_unregister() {
    let registry = TextStreamRegistry::new();
    let subscription = registry.register("lk.chat", |_| {}).unwrap();

    registry.unregister("lk.chat").unwrap();
    assert!(matches!(
        registry.unregister("lk.chat"),
        Err(TranscriptError::NotRegistered(_))
    ));

    // Drop logs the failure instead of panicking.
    drop(subscription);
    assert!(registry.topics().is_empty());
}

#[test]
fn test_stale_guard_keeps_newer_handler() {
    let registry = TextStreamRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let old = registry.register(TRANSCRIPTION_TOPIC, |_| {}).unwrap();
    registry.unregister(TRANSCRIPTION_TOPIC).unwrap();

    let counter = calls.clone();
    let newer = registry
        .register(TRANSCRIPTION_TOPIC, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    drop(old);
    assert!(registry.is_registered(TRANSCRIPTION_TOPIC));
    assert!(registry.dispatch(&segment("s1", "agent-1", "still here", true)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    drop(newer);
    assert!(!registry.is_registered(TRANSCRIPTION_TOPIC));
}

#[test]
fn test_unknown_topic_ignored() {
    let registry = TextStreamRegistry::new();
    let _sub = registry.register(TRANSCRIPTION_TOPIC, |_| panic!("wrong topic")).unwrap();
    let stream = TextStream::new("x", "lk.chat", "bob", "hello");
    assert!(!registry.dispatch(&stream));
}

#[test]
fn test_handler_feeds_transcript() {
    let registry = TextStreamRegistry::new();
    let transcript = Arc::new(Mutex::new(Transcript::new(10).unwrap()));

    let sink = transcript.clone();
    let _sub = registry
        .register(TRANSCRIPTION_TOPIC, move |stream| {
            sink.lock().unwrap().apply(stream.to_entry("alice"));
        })
        .unwrap();

    registry.dispatch(&segment("u1", "alice", "what's the weather", true));
    registry.dispatch(&segment("a1", "agent-xyz", "It is", false));
    registry.dispatch(&segment("a1", "agent-xyz", "It is sunny.", true));

    let transcript = transcript.lock().unwrap();
    let lines: Vec<_> = transcript
        .iter()
        .map(|e| (e.source.label().to_string(), e.text.clone()))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("You".to_string(), "what's the weather".to_string()),
            ("Agent".to_string(), "It is sunny.".to_string()),
        ]
    );
    assert!(!transcript.is_remote_typing());
}

#[test]
fn test_stream_without_attributes_is_final_message() {
    let stream = TextStream::new("stream-9", TRANSCRIPTION_TOPIC, "agent-1", "Hi!");
    assert!(stream.is_final());
    assert_eq!(stream.segment_id(), "stream-9");

    let entry = stream.to_entry("alice");
    assert_eq!(entry.source, TranscriptSource::Remote("agent-1".into()));
    assert!(entry.is_final);
}
