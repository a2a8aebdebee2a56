use std::path::Path;

use tokio::fs;

use crate::error::{Result, YtprepError};

pub const DEFAULT_PROMPT: &str = "You are given the transcript, title, uploader, channel, and description of a YouTube video.\n\
Your task is to suggest three alternative titles for this video that are accurate, descriptive, and non-clickbait. \
The titles should reflect the actual content of the video without exaggeration. \
Each title should be a single sentence and under 100 characters.";

/// Where the prompt text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Override,
    File,
    BuiltIn,
}

/// Resolve the prompt: explicit override, then `prompt_file` if it exists,
/// then the built-in default.
pub async fn resolve_prompt(
    prompt_override: Option<&str>,
    prompt_file: Option<&Path>,
) -> Result<(String, PromptSource)> {
    if let Some(prompt) = prompt_override {
        return Ok((prompt.to_string(), PromptSource::Override));
    }

    if let Some(path) = prompt_file {
        match fs::read_to_string(path).await {
            Ok(content) => return Ok((content, PromptSource::File)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(YtprepError::Config {
                    reason: format!("failed to read prompt file {}: {}", path.display(), e),
                });
            }
        }
    }

    Ok((DEFAULT_PROMPT.to_string(), PromptSource::BuiltIn))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn override_wins() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("prompt.txt");
        std::fs::write(&file, "from file").unwrap();

        let (prompt, source) = resolve_prompt(Some("explicit"), Some(&file)).await.unwrap();
        assert_eq!(prompt, "explicit");
        assert_eq!(source, PromptSource::Override);
    }

    #[tokio::test]
    async fn file_used_when_present() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("prompt.txt");
        std::fs::write(&file, "from file\n").unwrap();

        let (prompt, source) = resolve_prompt(None, Some(&file)).await.unwrap();
        assert_eq!(prompt, "from file\n");
        assert_eq!(source, PromptSource::File);
    }

    #[tokio::test]
    async fn built_in_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.txt");

        let (prompt, source) = resolve_prompt(None, Some(&missing)).await.unwrap();
        assert_eq!(prompt, DEFAULT_PROMPT);
        assert_eq!(source, PromptSource::BuiltIn);

        let (_, source) = resolve_prompt(None, None).await.unwrap();
        assert_eq!(source, PromptSource::BuiltIn);
    }

    #[tokio::test]
    async fn unreadable_prompt_path_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(resolve_prompt(None, Some(tmp.path())).await.is_err());
    }
}
