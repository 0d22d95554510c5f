use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use briefing_core::{
    CustomConfig, Job, ProgressEvent, PromptTemplates, ProviderKind, ProviderResolver, Stage,
    StaticCredentials,
};
use briefing_engine::{
    AudioStore, AudioStream, AudioSynthesisError, ContentCollector, ContentFetchError,
    ContentSource, FailureKind, Orchestrator, ProgressSink, SpeechSynthesizer,
};
use bytes::Bytes;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

const AUDIO_NAME: &str = "2026-10-15T08-30-00-000Z.mp3";

#[derive(Default)]
struct RecordingSink(Mutex<Vec<ProgressEvent>>);

impl RecordingSink {
    fn events(&self) -> Vec<ProgressEvent> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ProgressSink for RecordingSink {
    async fn emit(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// Serves canned page text; unknown URLs fail, "/hang" never answers.
struct CannedPages(HashMap<String, String>);

impl CannedPages {
    fn new(pages: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self(
            pages
                .iter()
                .map(|(url, text)| (url.to_string(), text.to_string()))
                .collect(),
        ))
    }
}

#[async_trait::async_trait]
impl ContentSource for CannedPages {
    async fn fetch_text(&self, url: &str) -> Result<String, ContentFetchError> {
        if url.ends_with("/hang") {
            std::future::pending::<()>().await;
        }
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| ContentFetchError::new(FailureKind::HttpStatus(404), "not found"))
    }
}

/// Records the script it was given and returns canned audio.
#[derive(Default)]
struct FakeSpeech {
    scripts: Mutex<Vec<String>>,
    fail: bool,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, AudioSynthesisError> {
        self.scripts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(AudioSynthesisError::Status {
                status: 500,
                body: "voice unavailable".to_string(),
            });
        }
        let chunks: Vec<Result<Bytes, AudioSynthesisError>> =
            vec![Ok(Bytes::from_static(b"ID3fake"))];
        Ok(Box::pin(futures_util::stream::iter(chunks)))
    }
}

struct Harness {
    orchestrator: Orchestrator,
    speech: Arc<FakeSpeech>,
    audio_dir: TempDir,
}

fn harness(
    pages: Arc<CannedPages>,
    resolver: ProviderResolver,
    speech: FakeSpeech,
) -> Harness {
    let audio_dir = TempDir::new().unwrap();
    let speech = Arc::new(speech);
    let audio = AudioStore::new(audio_dir.path().to_path_buf()).with_clock(Arc::new(|| {
        Utc.with_ymd_and_hms(2026, 10, 15, 8, 30, 0)
            .single()
            .expect("valid instant")
    }));
    let orchestrator = Orchestrator::new(
        reqwest::Client::new(),
        ContentCollector::new(pages),
        resolver,
        speech.clone(),
        audio,
    )
    .with_date_source(Arc::new(|| "Thursday, October 15, 2026".to_string()));
    Harness {
        orchestrator,
        speech,
        audio_dir,
    }
}

fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for (i, delta) in deltas.iter().enumerate() {
        let finish = (i + 1 == deltas.len()).then_some("stop");
        let frame = json!({ "choices": [{ "delta": { "content": delta }, "finish_reason": finish }] });
        body.push_str(&format!("data: {frame}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn mount_completion(server: &MockServer, deltas: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(deltas), "text/event-stream"),
        )
        .mount(server)
        .await;
}

fn updates_until_generation(provider: &str) -> Vec<ProgressEvent> {
    vec![
        ProgressEvent::update("Gathering news from various sources..."),
        ProgressEvent::update("Analyzing the latest headlines..."),
        ProgressEvent::update(format!(
            "Compiling the most interesting stories using {provider}..."
        )),
        ProgressEvent::update("Crafting witty commentary..."),
    ]
}

fn terminal_count(events: &[ProgressEvent]) -> usize {
    events.iter().filter(|event| event.is_terminal()).count()
}

/// Matches when each needle occurs in the body after the previous one.
struct InOrder(Vec<&'static str>);

impl Match for InOrder {
    fn matches(&self, request: &Request) -> bool {
        let body = String::from_utf8_lossy(&request.body);
        let mut from = 0;
        for needle in &self.0 {
            match body[from..].find(needle) {
                Some(at) => from += at + needle.len(),
                None => return false,
            }
        }
        true
    }
}

/// Matches when the body does not contain the text.
struct Lacks(&'static str);

impl Match for Lacks {
    fn matches(&self, request: &Request) -> bool {
        !String::from_utf8_lossy(&request.body).contains(self.0)
    }
}

#[tokio::test]
async fn failed_middle_fetch_still_completes() {
    briefing_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer groq-env-key"))
        .and(InOrder(vec![
            "From https://u1.example/:",
            "Rates were held.",
            "From https://u3.example/:",
            "Chip exports rose.",
        ]))
        .and(Lacks("From https://u2.example/"))
        .and(body_string_contains("Thursday, October 15, 2026"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Good morning. ", "Rates held."]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resolver = ProviderResolver::new(Arc::new(
        StaticCredentials::new().with("GROQ_API_KEY", "groq-env-key"),
    ))
    .with_base_endpoint(ProviderKind::Groq, server.uri());
    let h = harness(
        CannedPages::new(&[
            ("https://u1.example/", "Rates were held."),
            ("https://u3.example/", "Chip exports rose."),
        ]),
        resolver,
        FakeSpeech::default(),
    );
    let job = Job::new([
        "https://u1.example/",
        "https://u2.example/",
        "https://u3.example/",
    ])
    .unwrap();
    let sink = RecordingSink::default();

    let state = h
        .orchestrator
        .run(job, &sink, &CancellationToken::new())
        .await;

    let mut expected = updates_until_generation("groq");
    expected.extend([
        ProgressEvent::content("Good morning. "),
        ProgressEvent::content("Rates held."),
        ProgressEvent::update("Preparing your personalized news roundup..."),
        ProgressEvent::complete(AUDIO_NAME),
    ]);
    assert_eq!(sink.events(), expected);
    assert_eq!(terminal_count(&sink.events()), 1);
    assert_eq!(state.stage(), Stage::Complete);
    assert_eq!(state.fetch_counts(), (2, 1));
    assert_eq!(state.transcript(), "Good morning. Rates held.");
    assert_eq!(
        h.speech.scripts.lock().unwrap().as_slice(),
        ["Good morning. Rates held.".to_string()]
    );
    assert_eq!(
        std::fs::read(h.audio_dir.path().join(AUDIO_NAME)).unwrap(),
        b"ID3fake"
    );
}

#[tokio::test]
async fn missing_credentials_fail_before_generation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = ProviderResolver::new(Arc::new(StaticCredentials::new()))
        .with_base_endpoint(ProviderKind::Groq, server.uri());
    let h = harness(
        CannedPages::new(&[("https://u1.example/", "Story")]),
        resolver,
        FakeSpeech::default(),
    );
    let sink = RecordingSink::default();

    let state = h
        .orchestrator
        .run(
            Job::new(["https://u1.example/"]).unwrap(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    let events = sink.events();
    assert_eq!(state.stage(), Stage::Failed);
    assert_eq!(terminal_count(&events), 1);
    assert!(!events
        .iter()
        .any(|event| matches!(event, ProgressEvent::Content { .. })));
    match events.last() {
        Some(ProgressEvent::Error { message }) => {
            assert!(message.contains("No LLM providers configured"), "{message}")
        }
        other => panic!("expected error event, got {other:?}"),
    }
    assert!(h.speech.scripts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn requested_provider_without_key_names_its_variable() {
    let resolver = ProviderResolver::new(Arc::new(
        StaticCredentials::new().with("GROQ_API_KEY", "groq-env-key"),
    ));
    let h = harness(
        CannedPages::new(&[("https://u1.example/", "Story")]),
        resolver,
        FakeSpeech::default(),
    );
    let sink = RecordingSink::default();
    let job = Job::new(["https://u1.example/"])
        .unwrap()
        .with_provider(ProviderKind::Mistral);

    h.orchestrator
        .run(job, &sink, &CancellationToken::new())
        .await;

    match sink.events().last() {
        Some(ProgressEvent::Error { message }) => assert!(message.contains("MISTRAL_API_KEY")),
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn custom_key_and_model_bypass_environment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-custom"))
        .and(body_partial_json(json!({ "model": "my-model" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["Hi."]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resolver = ProviderResolver::new(Arc::new(StaticCredentials::new()))
        .with_base_endpoint(ProviderKind::OpenAi, server.uri());
    let h = harness(
        CannedPages::new(&[("https://u1.example/", "Story")]),
        resolver,
        FakeSpeech::default(),
    );
    let job = Job::new(["https://u1.example/"])
        .unwrap()
        .with_provider(ProviderKind::OpenAi)
        .with_custom_config(CustomConfig {
            api_key: Some("sk-custom".to_string()),
            model: Some("my-model".to_string()),
        });
    let sink = RecordingSink::default();

    let state = h
        .orchestrator
        .run(job, &sink, &CancellationToken::new())
        .await;

    assert_eq!(state.stage(), Stage::Complete);
    assert_eq!(state.provider(), Some(ProviderKind::OpenAi));
    assert_eq!(&sink.events()[..4], &updates_until_generation("openai")[..]);
}

#[tokio::test]
async fn all_fetches_failing_reports_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = ProviderResolver::new(Arc::new(
        StaticCredentials::new().with("GROQ_API_KEY", "groq-env-key"),
    ))
    .with_base_endpoint(ProviderKind::Groq, server.uri());
    let h = harness(CannedPages::new(&[]), resolver, FakeSpeech::default());
    let sink = RecordingSink::default();

    h.orchestrator
        .run(
            Job::new(["https://u1.example/", "https://u2.example/"]).unwrap(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(
        sink.events(),
        vec![
            ProgressEvent::update("Gathering news from various sources..."),
            ProgressEvent::update("Analyzing the latest headlines..."),
            ProgressEvent::error("No content could be scraped"),
        ]
    );
}

#[tokio::test]
async fn generation_error_stops_the_job_without_audio() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let resolver = ProviderResolver::new(Arc::new(
        StaticCredentials::new().with("GROQ_API_KEY", "groq-env-key"),
    ))
    .with_base_endpoint(ProviderKind::Groq, server.uri());
    let h = harness(
        CannedPages::new(&[("https://u1.example/", "Story")]),
        resolver,
        FakeSpeech::default(),
    );
    let sink = RecordingSink::default();

    let state = h
        .orchestrator
        .run(
            Job::new(["https://u1.example/"]).unwrap(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(state.stage(), Stage::Failed);
    let events = sink.events();
    assert_eq!(terminal_count(&events), 1);
    match events.last() {
        Some(ProgressEvent::Error { message }) => {
            assert!(message.starts_with("Text generation failed"), "{message}");
            assert!(message.contains("overloaded"), "{message}");
        }
        other => panic!("expected error event, got {other:?}"),
    }
    assert!(h.speech.scripts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn synthesis_failure_is_the_terminal_error() {
    let server = MockServer::start().await;
    mount_completion(&server, &["Hello."]).await;

    let resolver = ProviderResolver::new(Arc::new(
        StaticCredentials::new().with("GROQ_API_KEY", "groq-env-key"),
    ))
    .with_base_endpoint(ProviderKind::Groq, server.uri());
    let h = harness(
        CannedPages::new(&[("https://u1.example/", "Story")]),
        resolver,
        FakeSpeech {
            fail: true,
            ..FakeSpeech::default()
        },
    );
    let sink = RecordingSink::default();

    h.orchestrator
        .run(
            Job::new(["https://u1.example/"]).unwrap(),
            &sink,
            &CancellationToken::new(),
        )
        .await;

    let events = sink.events();
    assert_eq!(terminal_count(&events), 1);
    assert!(events.contains(&ProgressEvent::content("Hello.")));
    match events.last() {
        Some(ProgressEvent::Error { message }) => {
            assert!(message.starts_with("Audio synthesis failed"), "{message}")
        }
        other => panic!("expected error event, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(h.audio_dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn job_prompt_override_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Summarize in one line: \\n\\nFrom https://u1.example/:\\nStory"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(sse_body(&["Done."]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let resolver = ProviderResolver::new(Arc::new(
        StaticCredentials::new().with("GROQ_API_KEY", "groq-env-key"),
    ))
    .with_base_endpoint(ProviderKind::Groq, server.uri());
    let h = harness(
        CannedPages::new(&[("https://u1.example/", "Story")]),
        resolver,
        FakeSpeech::default(),
    );
    let job = Job::new(["https://u1.example/"])
        .unwrap()
        .with_prompt_overrides(PromptTemplates {
            system: None,
            user: Some("Summarize in one line: {content}".to_string()),
        });
    let sink = RecordingSink::default();

    let state = h
        .orchestrator
        .run(job, &sink, &CancellationToken::new())
        .await;
    assert_eq!(state.stage(), Stage::Complete);
}

#[tokio::test]
async fn cancellation_ends_the_job_with_an_error() {
    let resolver = ProviderResolver::new(Arc::new(
        StaticCredentials::new().with("GROQ_API_KEY", "groq-env-key"),
    ));
    let h = harness(CannedPages::new(&[]), resolver, FakeSpeech::default());
    let sink = RecordingSink::default();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        h.orchestrator.run(
            Job::new(["https://slow.example/hang"]).unwrap(),
            &sink,
            &cancel,
        ),
    )
    .await
    .expect("run returns after cancellation");

    assert_eq!(state.stage(), Stage::Failed);
    assert_eq!(sink.events().last(), Some(&ProgressEvent::error("Job cancelled")));
    assert_eq!(terminal_count(&sink.events()), 1);
}
