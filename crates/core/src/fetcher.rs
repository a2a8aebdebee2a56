use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::{
    config::FetcherConfig,
    error::{Result, YtprepError},
    types::{CaptionKind, CaptionReference, VideoMetadata},
    video_id::VideoId,
};

/// Caption format this crate parses natively.
pub const NATIVE_CAPTION_EXT: &str = "vtt";

/// Source of video metadata and caption payloads.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata>;

    async fn fetch_captions(&self, id: &VideoId, caption: &CaptionReference) -> Result<String>;
}

/// Subset of the `yt-dlp --dump-single-json` output we rely on.
#[derive(Debug, Default, Deserialize)]
struct InfoDump {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    subtitles: Option<HashMap<String, Vec<SubtitleFormat>>>,
    #[serde(default)]
    automatic_captions: Option<HashMap<String, Vec<SubtitleFormat>>>,
}

#[derive(Debug, Deserialize)]
struct SubtitleFormat {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    ext: Option<String>,
}

/// Metadata via the `yt-dlp` executable, captions via plain HTTP.
pub struct YtDlpFetcher {
    config: FetcherConfig,
    client: reqwest::Client,
}

impl YtDlpFetcher {
    pub fn new(config: FetcherConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(config: FetcherConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl MetadataFetcher for YtDlpFetcher {
    async fn fetch_metadata(&self, id: &VideoId) -> Result<VideoMetadata> {
        tracing::info!(video_id = %id, "Fetching metadata with {}", self.config.yt_dlp);

        let output = Command::new(&self.config.yt_dlp)
            .arg("--dump-single-json")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg(id.watch_url())
            .output()
            .await
            .map_err(|e| YtprepError::FetchFailed {
                video_id: id.to_string(),
                reason: format!("failed to run {}: {}", self.config.yt_dlp, e),
            })?;

        if !output.status.success() {
            return Err(YtprepError::FetchFailed {
                video_id: id.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let dump: InfoDump =
            serde_json::from_slice(&output.stdout).map_err(|e| YtprepError::FetchFailed {
                video_id: id.to_string(),
                reason: format!("unexpected yt-dlp output: {}", e),
            })?;

        Ok(metadata_from_dump(id.clone(), dump, &self.config.language))
    }

    async fn fetch_captions(&self, id: &VideoId, caption: &CaptionReference) -> Result<String> {
        tracing::info!(video_id = %id, ext = %caption.ext, kind = ?caption.kind, "Downloading captions");

        let fail = |e: reqwest::Error| YtprepError::FetchFailed {
            video_id: id.to_string(),
            reason: format!("caption download failed: {}", e),
        };

        self.client
            .get(&caption.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fail)?
            .text()
            .await
            .map_err(fail)
    }
}

fn metadata_from_dump(id: VideoId, dump: InfoDump, language: &str) -> VideoMetadata {
    let subtitles = dump
        .subtitles
        .as_ref()
        .and_then(|tracks| select_track(tracks, language, CaptionKind::Human))
        .or_else(|| {
            dump.automatic_captions
                .as_ref()
                .and_then(|tracks| select_track(tracks, language, CaptionKind::Auto))
        });

    VideoMetadata::new(
        id,
        dump.title.unwrap_or_default(),
        dump.uploader,
        dump.channel,
        dump.description.unwrap_or_default(),
        subtitles,
    )
}

/// Pick a track for `language` (exact key first, then regional variants such
/// as `en-US`), preferring the native caption format over the first entry.
fn select_track(
    tracks: &HashMap<String, Vec<SubtitleFormat>>,
    language: &str,
    kind: CaptionKind,
) -> Option<CaptionReference> {
    let regional_prefix = format!("{}-", language);
    let mut regional: Vec<&String> = tracks
        .keys()
        .filter(|k| k.starts_with(&regional_prefix))
        .collect();
    regional.sort();

    std::iter::once(language)
        .chain(regional.into_iter().map(String::as_str))
        .filter_map(|lang| tracks.get(lang))
        .find_map(|formats| best_format(formats, kind))
}

fn best_format(formats: &[SubtitleFormat], kind: CaptionKind) -> Option<CaptionReference> {
    let usable = || formats.iter().filter(|f| f.url.is_some());
    let chosen = usable()
        .find(|f| f.ext.as_deref() == Some(NATIVE_CAPTION_EXT))
        .or_else(|| usable().next())?;

    Some(CaptionReference {
        url: chosen.url.clone()?,
        ext: chosen
            .ext
            .clone()
            .unwrap_or_else(|| NATIVE_CAPTION_EXT.to_string()),
        kind,
    })
}
