use std::collections::VecDeque;
use std::sync::Arc;

use briefing_core::{
    update, Effect, Job, JobState, Msg, PromptTemplates, ProviderResolver, Stage,
};
use briefing_logging::{briefing_debug, briefing_info, briefing_warn};
use futures_util::StreamExt;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::provider::{ChunkStream, TextGenerator};
use crate::{AudioStore, AudioSynthesisError, ContentCollector, ProgressSink, SpeechSynthesizer};

pub type DateSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Runs jobs end to end: collect, aggregate, resolve, generate, synthesize.
///
/// Each [`run`](Orchestrator::run) owns its job state; the orchestrator itself
/// only holds shared read-only collaborators and can serve concurrent jobs.
#[derive(Clone)]
pub struct Orchestrator {
    client: Client,
    collector: ContentCollector,
    resolver: ProviderResolver,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    audio: AudioStore,
    templates: PromptTemplates,
    today: DateSource,
}

impl Orchestrator {
    pub fn new(
        client: Client,
        collector: ContentCollector,
        resolver: ProviderResolver,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        audio: AudioStore,
    ) -> Self {
        Self {
            client,
            collector,
            resolver,
            synthesizer,
            audio,
            templates: PromptTemplates::default(),
            today: Arc::new(|| {
                chrono::Local::now()
                    .format("%A, %B %-d, %Y")
                    .to_string()
            }),
        }
    }

    /// Configured prompt templates, used when a job brings no override.
    pub fn with_prompt_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Replaces the `{date}` source.
    pub fn with_date_source(mut self, today: DateSource) -> Self {
        self.today = today;
        self
    }

    /// Drives one job to its terminal event and returns the final state.
    ///
    /// Exactly one Complete or Error event reaches `sink`. Cancelling `cancel`
    /// abandons whatever is in flight and ends the job with an error.
    pub async fn run(
        &self,
        job: Job,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> JobState {
        let mut state = JobState::new(job, self.templates.clone(), (self.today)());
        let mut inbox = VecDeque::from([Msg::Start]);
        let mut generation: Option<ChunkStream> = None;

        loop {
            let msg = match inbox.pop_front() {
                Some(msg) => msg,
                None => match generation.as_mut() {
                    Some(stream) => next_chunk(stream, cancel).await,
                    None => break,
                },
            };

            let before = state.stage();
            let (next, effects) = update(state, msg);
            state = next;
            if state.stage() != before {
                briefing_debug!("Job stage {:?} -> {:?}", before, state.stage());
            }

            for effect in effects {
                if let Some(msg) = self.execute(effect, sink, &mut generation, cancel).await {
                    inbox.push_back(msg);
                }
            }

            if state.stage().is_terminal() {
                break;
            }
        }

        match (state.stage(), state.error()) {
            (Stage::Complete, _) => briefing_info!(
                "Job complete: {} ({} chars of script)",
                state.audio_file_name().unwrap_or_default(),
                state.transcript().len()
            ),
            (_, Some(err)) => briefing_warn!("Job failed: {}", err),
            (stage, None) => briefing_warn!("Job stopped without a terminal event at {:?}", stage),
        }
        state
    }

    async fn execute(
        &self,
        effect: Effect,
        sink: &dyn ProgressSink,
        generation: &mut Option<ChunkStream>,
        cancel: &CancellationToken,
    ) -> Option<Msg> {
        match effect {
            Effect::Emit(event) => {
                sink.emit(event).await;
                None
            }
            Effect::CollectContent { urls } => {
                briefing_info!("Collecting content from {} URLs", urls.len());
                Some(tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Msg::Cancelled,
                    fragments = self.collector.collect(&urls) => Msg::FetchesSettled(fragments),
                })
            }
            Effect::ResolveProvider { requested, custom } => {
                let resolved = self.resolver.resolve(requested, custom.as_ref());
                if let Ok(config) = &resolved {
                    briefing_info!(
                        "Resolved provider {} with model {} (custom model: {})",
                        config.provider,
                        config.model,
                        config.is_custom_model
                    );
                }
                Some(Msg::ProviderResolved(resolved))
            }
            Effect::StartGeneration { config, prompts } => {
                let generator = TextGenerator::from_config(self.client.clone(), &config);
                *generation = Some(generator.generate(&prompts.user, &prompts.system));
                None
            }
            Effect::StopGeneration => {
                *generation = None;
                None
            }
            Effect::Synthesize { transcript } => Some(tokio::select! {
                biased;
                _ = cancel.cancelled() => Msg::Cancelled,
                result = self.synthesize(&transcript) => {
                    Msg::SynthesisFinished(result.map_err(|err| err.to_string()))
                }
            }),
        }
    }

    async fn synthesize(&self, transcript: &str) -> Result<String, AudioSynthesisError> {
        briefing_info!("Synthesizing {} chars of script", transcript.len());
        let audio = self.synthesizer.synthesize(transcript).await?;
        self.audio.save(audio).await
    }
}

async fn next_chunk(stream: &mut ChunkStream, cancel: &CancellationToken) -> Msg {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Msg::Cancelled,
        next = stream.next() => match next {
            Some(Ok(chunk)) => Msg::ChunkReceived(chunk),
            Some(Err(err)) => Msg::GenerationFailed(err.to_string()),
            None => Msg::GenerationExhausted,
        },
    }
}
