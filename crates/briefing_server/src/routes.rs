use std::convert::Infallible;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{
        header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use briefing_core::{Job, JobRequest};
use briefing_engine::{is_safe_file_name, EventStreamEmitter, Orchestrator};
use briefing_logging::{briefing_info, briefing_warn};
use futures_util::stream;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate-podcast", post(generate_podcast))
        .route("/audio/{name}", get(audio_file))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Starts a job and streams its progress events back as they happen.
async fn generate_podcast(State(state): State<AppState>, body: Bytes) -> Response {
    let job = match parse_job(&body) {
        Ok(job) => job,
        Err(message) => {
            briefing_warn!("Rejected briefing request: {}", message);
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
    };
    briefing_info!("Accepted briefing request for {} URLs", job.urls().len());

    let (emitter, rx) = EventStreamEmitter::channel();
    tokio::spawn(run_job(state.orchestrator, job, emitter));

    (
        [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache"),
            (CONNECTION, "keep-alive"),
        ],
        Body::from_stream(frames(rx)),
    )
        .into_response()
}

fn parse_job(body: &[u8]) -> Result<Job, String> {
    let request: JobRequest =
        serde_json::from_slice(body).map_err(|err| format!("Invalid request body: {err}"))?;
    request.into_job().map_err(|err| err.to_string())
}

fn frames(
    rx: Receiver<Bytes>,
) -> impl futures_util::Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|frame| (Ok(frame), rx))
    })
}

/// Runs one job; a caller that hangs up cancels it.
async fn run_job(orchestrator: Orchestrator, job: Job, emitter: EventStreamEmitter) {
    let cancel = CancellationToken::new();

    // Taken before the job runs, so the stream is still live here.
    let closed = emitter.closed();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if closed.await {
                briefing_info!("Caller disconnected; cancelling job");
                cancel.cancel();
            }
        })
    };

    orchestrator.run(job, &emitter, &cancel).await;
    // The watcher holds the stream open; stop it so the response can end.
    watcher.abort();
}

async fn audio_file(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if !is_safe_file_name(&name) {
        return (StatusCode::BAD_REQUEST, "Invalid file name").into_response();
    }
    match tokio::fs::read(state.public_dir.join(&name)).await {
        Ok(bytes) => ([(CONTENT_TYPE, "audio/mpeg")], bytes).into_response(),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            StatusCode::NOT_FOUND.into_response()
        }
        Err(err) => {
            briefing_warn!("Failed to read audio file {}: {}", name, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
