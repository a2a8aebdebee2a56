use serde::{Deserialize, Serialize};

use crate::video_id::VideoId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionKind {
    Human,
    Auto,
}

impl CaptionKind {
    /// Label used in the consolidated artifact header.
    pub fn label(&self) -> &'static str {
        match self {
            CaptionKind::Human => "Human",
            CaptionKind::Auto => "Auto-generated",
        }
    }
}

/// Where to download the selected English caption track from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionReference {
    pub url: String,
    pub ext: String,
    #[serde(rename = "type")]
    pub kind: CaptionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: VideoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subtitles: Option<CaptionReference>,
}

impl VideoMetadata {
    /// Build metadata, treating blank uploader/channel values as absent.
    pub fn new(
        video_id: VideoId,
        title: impl Into<String>,
        uploader: Option<String>,
        channel: Option<String>,
        description: impl Into<String>,
        subtitles: Option<CaptionReference>,
    ) -> Self {
        Self {
            video_id,
            title: title.into(),
            uploader: non_blank(uploader),
            channel: non_blank(channel),
            description: description.into(),
            subtitles,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_json_shape() {
        let meta = VideoMetadata::new(
            VideoId::parse("dQw4w9WgXcQ").unwrap(),
            "Never Gonna Give You Up",
            Some("Rick Astley".into()),
            Some("".into()),
            "",
            Some(CaptionReference {
                url: "https://example.com/subs.vtt".into(),
                ext: "vtt".into(),
                kind: CaptionKind::Auto,
            }),
        );

        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["video_id"], "dQw4w9WgXcQ");
        assert_eq!(json["uploader"], "Rick Astley");
        assert!(json.get("channel").is_none());
        assert_eq!(json["subtitles"]["type"], "auto");

        let back: VideoMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn metadata_rejects_bad_video_id() {
        let json = r#"{"video_id": "nope", "title": "x"}"#;
        assert!(serde_json::from_str::<VideoMetadata>(json).is_err());
    }

    #[test]
    fn caption_kind_labels() {
        assert_eq!(CaptionKind::Human.label(), "Human");
        assert_eq!(CaptionKind::Auto.label(), "Auto-generated");
    }
}
