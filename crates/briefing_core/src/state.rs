use crate::{Job, PipelineError, PromptPair, PromptTemplates, ProviderKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    Pending,
    Fetching,
    Aggregating,
    Resolving,
    Generating,
    Synthesizing,
    Complete,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Complete | Stage::Failed)
    }
}

/// State of one job. Owned by a single orchestrator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobState {
    job: Job,
    templates: PromptTemplates,
    date: String,
    stage: Stage,
    fetched: usize,
    failed: usize,
    prompts: Option<PromptPair>,
    provider: Option<ProviderKind>,
    transcript: String,
    audio_file_name: Option<String>,
    error: Option<PipelineError>,
}

impl JobState {
    /// `templates` are the configured prompt templates; `date` fills `{date}`.
    pub fn new(job: Job, templates: PromptTemplates, date: impl Into<String>) -> Self {
        Self {
            job,
            templates,
            date: date.into(),
            stage: Stage::Pending,
            fetched: 0,
            failed: 0,
            prompts: None,
            provider: None,
            transcript: String::new(),
            audio_file_name: None,
            error: None,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn prompts(&self) -> Option<&PromptPair> {
        self.prompts.as_ref()
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        self.provider
    }

    /// Counts of successful and failed fetches once collection settled.
    pub fn fetch_counts(&self) -> (usize, usize) {
        (self.fetched, self.failed)
    }

    pub fn audio_file_name(&self) -> Option<&str> {
        self.audio_file_name.as_deref()
    }

    pub fn error(&self) -> Option<&PipelineError> {
        self.error.as_ref()
    }

    pub(crate) fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    pub(crate) fn date(&self) -> &str {
        &self.date
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    pub(crate) fn record_fetches(&mut self, fetched: usize, failed: usize) {
        self.fetched = fetched;
        self.failed = failed;
    }

    pub(crate) fn set_prompts(&mut self, prompts: PromptPair) {
        self.prompts = Some(prompts);
    }

    pub(crate) fn set_provider(&mut self, provider: ProviderKind) {
        self.provider = Some(provider);
    }

    pub(crate) fn append_transcript(&mut self, content: &str) {
        self.transcript.push_str(content);
    }

    pub(crate) fn complete(&mut self, audio_file_name: String) {
        self.stage = Stage::Complete;
        self.audio_file_name = Some(audio_file_name);
    }

    pub(crate) fn fail(&mut self, error: PipelineError) {
        self.stage = Stage::Failed;
        self.error = Some(error);
    }
}
