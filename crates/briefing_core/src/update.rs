use crate::{
    aggregate, build_prompts, Effect, JobState, Msg, PipelineError, ProgressEvent, Stage,
};

/// Pure update function: applies a message to the job state and returns the effects to run.
///
/// Messages that do not fit the current stage are ignored, so once a job is
/// complete or failed nothing else is emitted.
pub fn update(mut state: JobState, msg: Msg) -> (JobState, Vec<Effect>) {
    if state.stage().is_terminal() {
        return (state, Vec::new());
    }

    let effects = match (state.stage(), msg) {
        (_, Msg::Cancelled) => fail(&mut state, PipelineError::Cancelled),
        (Stage::Pending, Msg::Start) => {
            state.set_stage(Stage::Fetching);
            vec![
                Effect::Emit(ProgressEvent::update(
                    "Gathering news from various sources...",
                )),
                Effect::Emit(ProgressEvent::update("Analyzing the latest headlines...")),
                Effect::CollectContent {
                    urls: state.job().urls().to_vec(),
                },
            ]
        }
        (Stage::Fetching, Msg::FetchesSettled(fragments)) => {
            state.set_stage(Stage::Aggregating);
            let fetched = fragments.iter().filter(|f| f.ok).count();
            state.record_fetches(fetched, fragments.len() - fetched);
            match aggregate(&fragments) {
                Ok(content) => {
                    let prompts = build_prompts(
                        state.job().prompt_overrides(),
                        state.templates(),
                        state.date(),
                        &content,
                    );
                    state.set_prompts(prompts);
                    state.set_stage(Stage::Resolving);
                    vec![Effect::ResolveProvider {
                        requested: state.job().requested_provider(),
                        custom: state.job().custom_config().cloned(),
                    }]
                }
                Err(err) => fail(&mut state, err),
            }
        }
        (Stage::Resolving, Msg::ProviderResolved(Ok(config))) => match state.prompts().cloned() {
            Some(prompts) => {
                state.set_provider(config.provider);
                state.set_stage(Stage::Generating);
                vec![
                    Effect::Emit(ProgressEvent::update(format!(
                        "Compiling the most interesting stories using {}...",
                        config.provider
                    ))),
                    Effect::Emit(ProgressEvent::update("Crafting witty commentary...")),
                    Effect::StartGeneration { config, prompts },
                ]
            }
            None => fail(&mut state, PipelineError::NoContent),
        },
        (Stage::Resolving, Msg::ProviderResolved(Err(err))) => fail(&mut state, err.into()),
        (Stage::Generating, Msg::ChunkReceived(chunk)) => {
            state.append_transcript(&chunk.content);
            let mut effects = vec![Effect::Emit(ProgressEvent::content(chunk.content))];
            if chunk.is_final {
                state.set_stage(Stage::Synthesizing);
                effects.push(Effect::StopGeneration);
                effects.push(Effect::Emit(ProgressEvent::update(
                    "Preparing your personalized news roundup...",
                )));
                effects.push(Effect::Synthesize {
                    transcript: state.transcript().to_string(),
                });
            }
            effects
        }
        (Stage::Generating, Msg::GenerationFailed(message)) => {
            fail(&mut state, PipelineError::GenerationStream(message))
        }
        (Stage::Generating, Msg::GenerationExhausted) => fail(
            &mut state,
            PipelineError::GenerationStream("stream ended before completion".to_string()),
        ),
        (Stage::Synthesizing, Msg::SynthesisFinished(Ok(audio_file_name))) => {
            state.complete(audio_file_name.clone());
            vec![Effect::Emit(ProgressEvent::complete(audio_file_name))]
        }
        (Stage::Synthesizing, Msg::SynthesisFinished(Err(message))) => {
            fail(&mut state, PipelineError::AudioSynthesis(message))
        }
        _ => Vec::new(),
    };

    (state, effects)
}

fn fail(state: &mut JobState, error: PipelineError) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if state.stage() == Stage::Generating {
        effects.push(Effect::StopGeneration);
    }
    effects.push(Effect::Emit(ProgressEvent::error(error.to_string())));
    state.fail(error);
    effects
}
