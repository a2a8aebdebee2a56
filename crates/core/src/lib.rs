//! ytprep Core Library
//!
//! Fetches YouTube metadata and English subtitles, flattens the caption track
//! into plain text, and assembles a prompt for title suggestions.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod flatten;
pub mod format;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod types;
pub mod video_id;
pub mod vtt;

// Re-export commonly used items at crate root
pub use cache::{Artifact, CacheStore, get_root_cache_dir};
pub use config::{Config, FetcherConfig, GenerationConfig};
pub use error::{Result, YtprepError};
pub use fetcher::{MetadataFetcher, YtDlpFetcher};
pub use flatten::{FlattenedTranscript, decode_entities, flatten_cues, flatten_vtt};
pub use format::format_final_artifact;
pub use pipeline::{
    GENERATION_ERROR_PREFIX, Pipeline, PipelineResult, PipelineSettings, ProcessOptions,
    ProcessedVideo,
};
pub use prompt::{DEFAULT_PROMPT, PromptSource, resolve_prompt};
pub use provider::{GeminiClient, GenerationError, TextGenerator};
pub use types::{CaptionKind, CaptionReference, VideoMetadata};
pub use video_id::{VideoId, extract_video_id};
pub use vtt::{CaptionCue, parse_vtt};
