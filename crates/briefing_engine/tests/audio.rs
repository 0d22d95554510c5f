use std::sync::Arc;

use briefing_engine::{
    audio_file_name, is_safe_file_name, AudioStore, AudioStream, AudioSynthesisError,
    ElevenLabsSynthesizer, SpeechSynthesizer,
};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixed_clock() -> briefing_engine::Clock {
    Arc::new(|| {
        Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0)
            .single()
            .expect("valid instant")
            + chrono::Duration::milliseconds(123)
    })
}

#[test]
fn audio_file_name_is_a_safe_timestamp() {
    let name = audio_file_name((fixed_clock())());
    assert_eq!(name, "2026-10-15T08-30-00-123Z.mp3");
    assert!(is_safe_file_name(&name));
}

#[test]
fn unsafe_names_are_rejected() {
    for name in ["", "../secret.mp3", ".hidden", "a/b.mp3", "a b.mp3", "a\\b.mp3"] {
        assert!(!is_safe_file_name(name), "{name:?} accepted");
    }
}

#[tokio::test]
async fn elevenlabs_audio_is_stored_under_timestamp_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/voice-1"))
        .and(header("xi-api-key", "el-key"))
        .and(header("accept", "audio/mpeg"))
        .and(body_json(json!({ "text": "Hello listeners", "model_id": "model-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"ID3audio".to_vec(), "audio/mpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let synthesizer = ElevenLabsSynthesizer::new(reqwest::Client::new(), "el-key")
        .with_base_url(server.uri())
        .with_voice("voice-1", "model-1");
    let store = AudioStore::new(dir.path().join("public")).with_clock(fixed_clock());

    let audio = synthesizer
        .synthesize("Hello listeners")
        .await
        .expect("audio stream");
    let name = store.save(audio).await.expect("saved");

    assert_eq!(name, "2026-10-15T08-30-00-123Z.mp3");
    let written = std::fs::read(store.dir().join(&name)).unwrap();
    assert_eq!(written, b"ID3audio");
}

#[tokio::test]
async fn elevenlabs_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let synthesizer =
        ElevenLabsSynthesizer::new(reqwest::Client::new(), "nope").with_base_url(server.uri());
    let Err(err) = synthesizer.synthesize("text").await else {
        panic!("expected synthesis to fail");
    };
    assert!(matches!(
        err,
        AudioSynthesisError::Status { status: 401, ref body } if body == "bad key"
    ));
}

#[tokio::test]
async fn empty_audio_is_not_stored() {
    let dir = TempDir::new().unwrap();
    let store = AudioStore::new(dir.path().to_path_buf()).with_clock(fixed_clock());
    let empty: AudioStream = Box::pin(futures_util::stream::empty());

    let err = store.save(empty).await.unwrap_err();
    assert!(matches!(err, AudioSynthesisError::Empty));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn chunked_audio_is_joined_in_order() {
    let dir = TempDir::new().unwrap();
    let store = AudioStore::new(dir.path().to_path_buf()).with_clock(fixed_clock());
    let chunks: Vec<Result<Bytes, AudioSynthesisError>> = vec![
        Ok(Bytes::from_static(b"ID3")),
        Ok(Bytes::from_static(b"-part-1")),
        Ok(Bytes::from_static(b"-part-2")),
    ];
    let audio: AudioStream = Box::pin(futures_util::stream::iter(chunks));

    let name = store.save(audio).await.unwrap();
    assert_eq!(
        std::fs::read(dir.path().join(name)).unwrap(),
        b"ID3-part-1-part-2"
    );
}
