//! Canonical YouTube video identifiers.
//!
//! Accepts either a bare 11-character ID or any of the usual URL shapes
//! (`watch?v=`, `youtu.be/`, `/embed/`, `/shorts/`, `/v/`, `/live/`).

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, YtprepError};

pub const VIDEO_ID_LEN: usize = 11;

const SHORT_LINK_HOST: &str = "youtu.be";
const PATH_PREFIXES: [&str; 4] = ["embed", "shorts", "v", "live"];

/// An 11-character video identifier from the `[A-Za-z0-9_-]` alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VideoId(String);

impl VideoId {
    /// Validate a raw token as a video ID.
    pub fn parse(raw: &str) -> Option<Self> {
        is_video_id(raw).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VideoId {
    type Error = YtprepError;

    fn try_from(value: String) -> Result<Self> {
        if is_video_id(&value) {
            Ok(Self(value))
        } else {
            Err(YtprepError::InvalidIdentifier { input: value })
        }
    }
}

impl From<VideoId> for String {
    fn from(id: VideoId) -> Self {
        id.0
    }
}

fn is_video_id(s: &str) -> bool {
    s.len() == VIDEO_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    let h = h.strip_prefix("www.").unwrap_or(&h);
    matches!(
        h,
        "youtube.com" | "m.youtube.com" | "music.youtube.com" | "youtube-nocookie.com"
    )
}

/// Extract the canonical video ID from a URL or bare ID.
pub fn extract_video_id(input: &str) -> Result<VideoId> {
    let trimmed = input.trim();

    if let Some(id) = VideoId::parse(trimmed) {
        return Ok(id);
    }

    parse_url(trimmed)
        .and_then(|u| video_id_from_url(&u))
        .ok_or_else(|| YtprepError::InvalidIdentifier {
            input: input.to_string(),
        })
}

fn parse_url(input: &str) -> Option<Url> {
    match Url::parse(input) {
        Ok(u) => Some(u),
        // "youtu.be/ID" and "www.youtube.com/watch?v=ID" without a scheme
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("https://{input}")).ok()
        }
        Err(_) => None,
    }
}

fn video_id_from_url(u: &Url) -> Option<VideoId> {
    if !matches!(u.scheme(), "http" | "https") {
        return None;
    }
    let host = u.host_str()?;

    if host.eq_ignore_ascii_case(SHORT_LINK_HOST) {
        let path = u.path().trim_start_matches('/');
        return VideoId::parse(path.trim_end_matches('/'));
    }

    if !is_youtube_host(host) {
        return None;
    }

    if u.path() == "/watch" || u.path() == "/watch/" {
        return u
            .query_pairs()
            .find(|(k, _)| k == "v")
            .and_then(|(_, v)| VideoId::parse(&v));
    }

    let mut segs = u.path_segments()?;
    let prefix = segs.next()?;
    let candidate = segs.next()?;
    if !PATH_PREFIXES.contains(&prefix) {
        return None;
    }
    // Allow a single trailing slash but nothing deeper.
    match segs.next() {
        None | Some("") => VideoId::parse(candidate),
        Some(_) => None,
    }
}
