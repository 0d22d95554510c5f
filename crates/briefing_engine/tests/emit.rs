use std::time::Duration;

use briefing_core::ProgressEvent;
use briefing_engine::{EventStreamEmitter, ProgressSink, EVENT_BUFFER};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc::Receiver;

fn drain(rx: &mut Receiver<Bytes>) -> Vec<String> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(String::from_utf8(frame.to_vec()).unwrap());
    }
    frames
}

#[tokio::test]
async fn frames_events_as_server_sent_events() {
    let (emitter, mut rx) = EventStreamEmitter::channel();
    emitter
        .emit(ProgressEvent::update("Gathering news from various sources..."))
        .await;
    emitter.emit(ProgressEvent::content("Hello")).await;

    assert_eq!(
        drain(&mut rx),
        vec![
            "data: {\"type\":\"update\",\"message\":\"Gathering news from various sources...\"}\n\n",
            "data: {\"type\":\"content\",\"content\":\"Hello\"}\n\n",
        ]
    );
    assert!(!emitter.is_closed());
}

#[tokio::test]
async fn stream_closes_after_terminal_event() {
    let (emitter, mut rx) = EventStreamEmitter::channel();
    emitter
        .emit(ProgressEvent::complete("2026-10-15T08-30-00-123Z.mp3"))
        .await;
    emitter.emit(ProgressEvent::error("late")).await;

    assert_eq!(
        drain(&mut rx),
        vec!["data: {\"type\":\"complete\",\"audioFileName\":\"2026-10-15T08-30-00-123Z.mp3\"}\n\n"]
    );
    assert!(emitter.is_closed());
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
    ));
}

#[tokio::test]
async fn closed_reports_caller_going_away() {
    let (emitter, rx) = EventStreamEmitter::channel();
    let closed = emitter.closed();
    drop(rx);
    assert!(closed.await);
    assert!(emitter.is_closed());
    // Emitting into a dropped stream is tolerated.
    emitter.emit(ProgressEvent::update("nobody listening")).await;
}

#[tokio::test]
async fn finished_stream_is_not_a_disconnect() {
    let (emitter, _rx) = EventStreamEmitter::channel();
    emitter.emit(ProgressEvent::error("No content could be scraped")).await;

    let closed = tokio::time::timeout(Duration::from_secs(1), emitter.closed())
        .await
        .expect("resolves at once");
    assert!(!closed);
}

#[tokio::test]
async fn slow_reader_holds_back_the_emitter() {
    let (emitter, mut rx) = EventStreamEmitter::channel();
    for i in 0..EVENT_BUFFER {
        emitter.emit(ProgressEvent::content(format!("chunk {i}"))).await;
    }

    let overflow = emitter.emit(ProgressEvent::content("one too many"));
    tokio::pin!(overflow);
    assert!(
        tokio::time::timeout(Duration::from_millis(50), &mut overflow)
            .await
            .is_err(),
        "emit should wait while the buffer is full"
    );

    rx.recv().await.expect("first frame");
    tokio::time::timeout(Duration::from_secs(1), overflow)
        .await
        .expect("emit proceeds once the reader catches up");
    assert_eq!(drain(&mut rx).len(), EVENT_BUFFER);
}
