use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    cache::get_root_cache_dir,
    error::{Result, YtprepError},
};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

const LOCAL_CONFIG_FILE: &str = "ytprep.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the per-video cache entries.
    pub cache_dir: PathBuf,
    /// Default prompt file, used when present and no prompt is given explicitly.
    pub prompt_file: PathBuf,
    pub generation: GenerationConfig,
    pub fetcher: FetcherConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Explicit API key; takes precedence over `api_key_env`.
    pub api_key: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// `yt-dlp` executable name or path.
    pub yt_dlp: String,
    /// Caption language to select.
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: get_root_cache_dir(),
            prompt_file: PathBuf::from("prompt.txt"),
            generation: GenerationConfig::default(),
            fetcher: FetcherConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            api_key: String::new(),
            timeout_secs: 120,
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            yt_dlp: "yt-dlp".to_string(),
            language: "en".to_string(),
        }
    }
}

impl GenerationConfig {
    /// Explicit key first, then the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl Config {
    /// Load config and return the resolved file path (if any).
    ///
    /// Lookup order: explicit path, `./ytprep.toml`, the platform config
    /// directory (`<config>/ytprep/config.toml`), then defaults.
    pub fn load_with_path(path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(p) = path {
            return Ok((Self::from_file(p)?, Some(p.to_path_buf())));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Ok((Self::from_file(&local)?, Some(local)));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let platform_config = config_dir.join("ytprep").join("config.toml");
            if platform_config.is_file() {
                return Ok((Self::from_file(&platform_config)?, Some(platform_config)));
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok((Config::default(), None))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_path(path).map(|(config, _)| config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| YtprepError::Config {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| YtprepError::Config {
            reason: format!("failed to parse {}: {}", path.display(), e),
        })
    }
}
