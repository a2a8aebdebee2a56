use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::{
    error::{Result, YtprepError},
    video_id::VideoId,
};

/// Files stored in a video's cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Artifact {
    Metadata,
    SubtitlesRaw { ext: String },
    SubtitlesFlat,
    Title,
    Uploader,
    Channel,
    Description,
    Prompt,
    Final,
    GeminiResponse,
}

impl Artifact {
    pub fn file_name(&self) -> String {
        match self {
            Artifact::SubtitlesRaw { ext } => format!("subtitles_raw.{}", ext),
            other => format!("{}.{}", other.key(), other.default_ext()),
        }
    }

    /// Key used in the pipeline's artifact map.
    pub fn key(&self) -> &'static str {
        match self {
            Artifact::Metadata => "metadata",
            Artifact::SubtitlesRaw { .. } => "subtitles_raw",
            Artifact::SubtitlesFlat => "subtitles_flat",
            Artifact::Title => "title",
            Artifact::Uploader => "uploader",
            Artifact::Channel => "channel",
            Artifact::Description => "description",
            Artifact::Prompt => "prompt",
            Artifact::Final => "final",
            Artifact::GeminiResponse => "gemini_response",
        }
    }

    fn default_ext(&self) -> &'static str {
        match self {
            Artifact::Metadata => "json",
            Artifact::SubtitlesRaw { .. } => "vtt",
            _ => "txt",
        }
    }
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("ytprep")
}

/// Filesystem cache keyed by video ID: `<root>/<video_id>/<artifact>`.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_dir(&self, id: &VideoId) -> PathBuf {
        self.root.join(id.as_str())
    }

    pub fn artifact_path(&self, id: &VideoId, artifact: &Artifact) -> PathBuf {
        self.entry_dir(id).join(artifact.file_name())
    }

    pub async fn exists(&self, id: &VideoId) -> bool {
        fs::metadata(self.entry_dir(id))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    pub async fn has(&self, id: &VideoId, artifact: &Artifact) -> bool {
        fs::metadata(self.artifact_path(id, artifact))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    pub async fn read(&self, id: &VideoId, artifact: &Artifact) -> Result<Option<Vec<u8>>> {
        let path = self.artifact_path(id, artifact);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(YtprepError::cache_io(path, e)),
        }
    }

    pub async fn read_to_string(&self, id: &VideoId, artifact: &Artifact) -> Result<Option<String>> {
        let Some(bytes) = self.read(id, artifact).await? else {
            return Ok(None);
        };
        let path = self.artifact_path(id, artifact);
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| YtprepError::cache_io(path, std::io::Error::new(ErrorKind::InvalidData, e)))
    }

    /// Write (overwrite) an artifact, creating the entry directory if needed.
    pub async fn write(
        &self,
        id: &VideoId,
        artifact: &Artifact,
        contents: impl AsRef<[u8]>,
    ) -> Result<PathBuf> {
        let dir = self.entry_dir(id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| YtprepError::cache_io(&dir, e))?;

        let path = dir.join(artifact.file_name());
        fs::write(&path, contents)
            .await
            .map_err(|e| YtprepError::cache_io(&path, e))?;
        Ok(path)
    }

    /// Remove the whole entry. Missing entries are fine.
    pub async fn invalidate(&self, id: &VideoId) -> Result<()> {
        let dir = self.entry_dir(id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(YtprepError::cache_io(dir, e)),
        }
    }
}
