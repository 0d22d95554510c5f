//! Briefing engine: content collection, text generation backends, speech
//! synthesis and the orchestrator that executes the core state machine.
mod audio;
mod collect;
mod convert;
mod decode;
mod emit;
mod extract;
mod fetch;
mod filename;
mod orchestrator;
mod persist;
pub mod provider;
mod source;
mod synth;
mod types;

pub use audio::{AudioStore, Clock};
pub use collect::ContentCollector;
pub use convert::{tidy_markdown, Converter, Html2MdConverter};
pub use decode::{decode_page, DecodedPage};
pub use emit::{EventStreamEmitter, ProgressSink, EVENT_BUFFER};
pub use extract::{ExtractedContent, Extractor, ReadabilityLikeExtractor};
pub use fetch::{FetchSettings, ReqwestFetcher};
pub use filename::{audio_file_name, is_safe_file_name};
pub use orchestrator::{DateSource, Orchestrator};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use provider::{ChunkStream, GenerationError, TextGenerator};
pub use source::{ContentSource, FirecrawlSource, HtmlPageSource, FIRECRAWL_BASE_URL};
pub use synth::{
    AudioStream, AudioSynthesisError, ElevenLabsSynthesizer, SpeechSynthesizer, DEFAULT_TTS_MODEL,
    DEFAULT_VOICE_ID, ELEVENLABS_BASE_URL,
};
pub use types::{ContentFetchError, FailureKind, FetchMetadata, FetchOutput};
