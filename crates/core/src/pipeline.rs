//! Per-video processing pipeline.
//!
//! Steps run strictly in order, each gated by the cache:
//! metadata → captions → flattened transcript → prompt → metadata fields →
//! consolidated artifact → (optional) generated titles.
//!
//! Runs for the same video ID must not overlap; nothing here locks the cache
//! entry. Runs for different IDs share no state.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use crate::{
    cache::{Artifact, CacheStore},
    config::Config,
    error::Result,
    fetcher::MetadataFetcher,
    flatten::flatten_vtt,
    format::format_final_artifact,
    prompt::resolve_prompt,
    provider::TextGenerator,
    types::{CaptionKind, VideoMetadata},
    video_id::{VideoId, extract_video_id},
};

/// Prefix of the diagnostic stored in place of generated text on failure.
pub const GENERATION_ERROR_PREFIX: &str = "Error querying Gemini: ";

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Wipe the cache entry and fetch everything again.
    pub force_refresh: bool,
    pub request_generated_titles: bool,
    pub prompt_override: Option<String>,
    /// Overrides the pipeline's configured cache root for this run.
    pub cache_root: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub cache_root: PathBuf,
    pub prompt_file: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_root: config.cache_dir.clone(),
            prompt_file: Some(config.prompt_file.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedVideo {
    pub video_id: VideoId,
    pub cache_dir: PathBuf,
    /// Artifact key (`title`, `final`, ...) to file path.
    pub files: BTreeMap<&'static str, PathBuf>,
    pub subtitle_kind: CaptionKind,
    pub final_text: String,
    /// Generated text, or a diagnostic when generation failed. `None` when
    /// generation was not requested.
    pub generated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    Success(ProcessedVideo),
    /// The video has no usable English caption track.
    NoSubtitles { video_id: VideoId, cache_dir: PathBuf },
    /// `video_id` is empty when the input could not be resolved.
    Error { video_id: String, message: String },
}

impl PipelineResult {
    pub fn status(&self) -> &'static str {
        match self {
            PipelineResult::Success(_) => "success",
            PipelineResult::NoSubtitles { .. } => "no_subtitles",
            PipelineResult::Error { .. } => "error",
        }
    }

    /// Process exit code: 0 success, 2 no subtitles, 1 error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineResult::Success(_) => 0,
            PipelineResult::NoSubtitles { .. } => 2,
            PipelineResult::Error { .. } => 1,
        }
    }

    pub fn files(&self) -> BTreeMap<&'static str, PathBuf> {
        match self {
            PipelineResult::Success(video) => video.files.clone(),
            _ => BTreeMap::new(),
        }
    }
}

pub struct Pipeline {
    fetcher: Arc<dyn MetadataFetcher>,
    generator: Arc<dyn TextGenerator>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn MetadataFetcher>,
        generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Process one video. Never panics on bad input; every failure before the
    /// generation step becomes [`PipelineResult::Error`].
    pub async fn process(&self, input: &str, options: &ProcessOptions) -> PipelineResult {
        let video_id = match extract_video_id(input) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(input, "{}", e);
                return PipelineResult::Error {
                    video_id: String::new(),
                    message: e.to_string(),
                };
            }
        };

        match self.run(&video_id, options).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(video_id = %video_id, "Pipeline failed: {}", e);
                PipelineResult::Error {
                    video_id: video_id.to_string(),
                    message: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, id: &VideoId, options: &ProcessOptions) -> Result<PipelineResult> {
        let root = options
            .cache_root
            .as_deref()
            .unwrap_or(self.settings.cache_root.as_path());
        let store = CacheStore::new(root);
        let cache_dir = store.entry_dir(id);
        let mut files = BTreeMap::new();

        if options.force_refresh {
            tracing::debug!(video_id = %id, "Invalidating cache entry");
            store.invalidate(id).await?;
        }

        let (metadata, metadata_path) = self.load_or_fetch_metadata(&store, id).await?;
        files.insert(Artifact::Metadata.key(), metadata_path);

        let Some(caption) = metadata.subtitles.clone() else {
            tracing::info!(video_id = %id, "No English subtitles available");
            return Ok(PipelineResult::NoSubtitles {
                video_id: id.clone(),
                cache_dir,
            });
        };

        let raw_artifact = Artifact::SubtitlesRaw {
            ext: caption.ext.clone(),
        };
        let raw = match store.read_to_string(id, &raw_artifact).await? {
            Some(raw) => {
                tracing::debug!(video_id = %id, "Raw subtitles (cached)");
                raw
            }
            None => {
                let raw = self.fetcher.fetch_captions(id, &caption).await?;
                store.write(id, &raw_artifact, &raw).await?;
                raw
            }
        };
        files.insert(raw_artifact.key(), store.artifact_path(id, &raw_artifact));

        let transcript = flatten_vtt(&raw)?;
        tracing::debug!(video_id = %id, lines = transcript.len(), "Subtitles flattened");
        let path = store
            .write(id, &Artifact::SubtitlesFlat, transcript.to_text())
            .await?;
        files.insert(Artifact::SubtitlesFlat.key(), path);

        let (prompt, source) = resolve_prompt(
            options.prompt_override.as_deref(),
            self.settings.prompt_file.as_deref(),
        )
        .await?;
        tracing::debug!(video_id = %id, ?source, "Prompt resolved");
        let path = store.write(id, &Artifact::Prompt, &prompt).await?;
        files.insert(Artifact::Prompt.key(), path);

        for (artifact, value) in metadata_fields(&metadata) {
            let path = store.write(id, &artifact, value).await?;
            files.insert(artifact.key(), path);
        }

        let final_text =
            format_final_artifact(&prompt, &metadata, &transcript, caption.kind.label());
        let previous_final = store.read_to_string(id, &Artifact::Final).await?;
        let path = store.write(id, &Artifact::Final, &final_text).await?;
        files.insert(Artifact::Final.key(), path);

        let generated = if options.request_generated_titles {
            let reusable = previous_final.as_deref() == Some(final_text.as_str());
            let text = self.generate(&store, id, &final_text, reusable).await?;
            files.insert(
                Artifact::GeminiResponse.key(),
                store.artifact_path(id, &Artifact::GeminiResponse),
            );
            Some(text)
        } else {
            None
        };

        Ok(PipelineResult::Success(ProcessedVideo {
            video_id: id.clone(),
            cache_dir,
            files,
            subtitle_kind: caption.kind,
            final_text,
            generated,
        }))
    }

    async fn load_or_fetch_metadata(
        &self,
        store: &CacheStore,
        id: &VideoId,
    ) -> Result<(VideoMetadata, PathBuf)> {
        if let Some(json) = store.read_to_string(id, &Artifact::Metadata).await? {
            tracing::debug!(video_id = %id, "Metadata (cached)");
            let metadata: VideoMetadata = serde_json::from_str(&json)?;
            return Ok((metadata, store.artifact_path(id, &Artifact::Metadata)));
        }

        let metadata = self.fetcher.fetch_metadata(id).await?;
        let json = serde_json::to_string_pretty(&metadata)?;
        let path = store.write(id, &Artifact::Metadata, json).await?;
        Ok((metadata, path))
    }

    /// Query the generator and persist whatever comes back. Failures become a
    /// persisted diagnostic string. A previous successful response is reused
    /// when the consolidated artifact is unchanged.
    async fn generate(
        &self,
        store: &CacheStore,
        id: &VideoId,
        final_text: &str,
        reusable: bool,
    ) -> Result<String> {
        if reusable {
            if let Some(cached) = store.read_to_string(id, &Artifact::GeminiResponse).await? {
                if !cached.starts_with(GENERATION_ERROR_PREFIX) {
                    tracing::debug!(video_id = %id, "Generated titles (cached)");
                    return Ok(cached);
                }
            }
        }

        let text = match self.generator.generate(final_text).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(video_id = %id, model = self.generator.model(), "Generation failed: {}", e);
                format!("{}{}", GENERATION_ERROR_PREFIX, e)
            }
        };
        store.write(id, &Artifact::GeminiResponse, &text).await?;
        Ok(text)
    }
}

fn metadata_fields(metadata: &VideoMetadata) -> Vec<(Artifact, &str)> {
    let mut fields = vec![(Artifact::Title, metadata.title.as_str())];
    if let Some(uploader) = metadata.uploader.as_deref() {
        fields.push((Artifact::Uploader, uploader));
    }
    if let Some(channel) = metadata.channel.as_deref() {
        fields.push((Artifact::Channel, channel));
    }
    fields.push((Artifact::Description, metadata.description.as_str()));
    fields
}
