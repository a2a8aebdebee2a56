use crate::{flatten::FlattenedTranscript, types::VideoMetadata};

/// Assemble the consolidated artifact sent to the model.
pub fn format_final_artifact(
    prompt: &str,
    metadata: &VideoMetadata,
    transcript: &FlattenedTranscript,
    subtitle_label: &str,
) -> String {
    let mut lines: Vec<String> = vec![prompt.to_string(), String::new()];

    lines.push(format!("Title: {}", metadata.title));
    if let Some(uploader) = &metadata.uploader {
        lines.push(format!("Uploader: {}", uploader));
    }
    if let Some(channel) = &metadata.channel {
        lines.push(format!("Channel: {}", channel));
    }

    lines.push("Description:".to_string());
    lines.push(metadata.description.clone());
    lines.push(String::new());

    lines.push(format!("Subtitles ({}):", subtitle_label));
    lines.push(transcript.to_text());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        flatten::flatten_cues,
        types::{CaptionKind, VideoMetadata},
        video_id::VideoId,
        vtt::CaptionCue,
    };

    fn transcript() -> FlattenedTranscript {
        flatten_cues(&[CaptionCue::from_text("line one"), CaptionCue::from_text("line two")])
    }

    #[test]
    fn full_metadata() {
        let meta = VideoMetadata::new(
            VideoId::parse("dQw4w9WgXcQ").unwrap(),
            "Title",
            Some("Uploader".into()),
            Some("Channel".into()),
            "Desc\nmore",
            None,
        );
        let out = format_final_artifact("PROMPT", &meta, &transcript(), CaptionKind::Human.label());
        assert_eq!(
            out,
            "PROMPT\n\nTitle: Title\nUploader: Uploader\nChannel: Channel\nDescription:\nDesc\nmore\n\n\
             Subtitles (Human):\nline one\nline two"
        );
    }

    #[test]
    fn optional_fields_omitted() {
        let meta = VideoMetadata::new(
            VideoId::parse("dQw4w9WgXcQ").unwrap(),
            "Title",
            None,
            Some("  ".into()),
            "",
            None,
        );
        let out = format_final_artifact("P", &meta, &FlattenedTranscript::default(), "Auto-generated");
        assert_eq!(
            out,
            "P\n\nTitle: Title\nDescription:\n\n\nSubtitles (Auto-generated):\n"
        );
    }
}
