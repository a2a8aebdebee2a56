//! Minimal WebVTT reader.
//!
//! Produces one [`CaptionCue`] per cue block. Cue tags (`<c>`, `<v Speaker>`,
//! inline `<00:00:01.000>` timestamps) are stripped; character entities are
//! left encoded for the flattener to decode.

use std::time::Duration;

use crate::error::{Result, YtprepError};

/// One timed caption unit. Text may span several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionCue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl CaptionCue {
    /// Untimed cue, handy when the source already dropped timings.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            start: Duration::ZERO,
            end: Duration::ZERO,
            text: text.into(),
        }
    }
}

pub fn parse_vtt(raw: &str) -> Result<Vec<CaptionCue>> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();

    let header = lines.first().copied().unwrap_or_default();
    if !is_header(header) {
        return Err(parse_error(1, "missing WEBVTT header"));
    }

    let mut cues = Vec::new();
    let mut idx = 0;

    // Blocks end only on an empty line; whitespace-only lines are cue text.
    while idx < lines.len() && !lines[idx].is_empty() {
        idx += 1;
    }

    while idx < lines.len() {
        if lines[idx].trim().is_empty() {
            idx += 1;
            continue;
        }

        let block_start = idx;
        while idx < lines.len() && !lines[idx].is_empty() {
            idx += 1;
        }
        let block = &lines[block_start..idx];

        if is_non_cue_block(block[0]) {
            continue;
        }

        let (timing_offset, timing) = match block.iter().position(|l| l.contains("-->")) {
            Some(pos @ (0 | 1)) => (pos, block[pos]),
            _ => {
                return Err(parse_error(
                    block_start + 1,
                    "cue block has no timing line",
                ));
            }
        };

        let (start, end) = parse_timing(timing)
            .ok_or_else(|| parse_error(block_start + timing_offset + 1, "invalid cue timing"))?;

        let text = block[timing_offset + 1..]
            .iter()
            .map(|line| strip_tags(line))
            .collect::<Vec<_>>()
            .join("\n");

        cues.push(CaptionCue { start, end, text });
    }

    Ok(cues)
}

fn parse_error(line: usize, reason: &str) -> YtprepError {
    YtprepError::CaptionParse {
        reason: format!("line {line}: {reason}"),
    }
}

fn is_header(line: &str) -> bool {
    match line.strip_prefix("WEBVTT") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t']),
        None => false,
    }
}

fn is_non_cue_block(first_line: &str) -> bool {
    ["NOTE", "STYLE", "REGION"].iter().any(|kw| {
        first_line
            .strip_prefix(kw)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '\t']))
    })
}

fn parse_timing(line: &str) -> Option<(Duration, Duration)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// `hh:mm:ss.ttt` or `mm:ss.ttt`.
fn parse_timestamp(ts: &str) -> Option<Duration> {
    let (clock, millis) = ts.split_once('.')?;
    if millis.len() != 3 {
        return None;
    }
    let millis: u64 = millis.parse().ok()?;

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return None,
    };
    if minutes.len() != 2 || seconds.len() != 2 {
        return None;
    }
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    if minutes > 59 || seconds > 59 {
        return None;
    }

    let total = hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)?;
    Some(Duration::from_millis(total))
}

fn strip_tags(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                // unterminated, keep verbatim
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cues_with_identifiers_and_settings() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                   1\n00:00:00.000 --> 00:00:01.500 align:start position:0%\nHello\nworld\n\n\
                   00:01.500 --> 00:03.000\nSecond\n";
        let cues = parse_vtt(vtt).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "Hello\nworld");
        assert_eq!(cues[0].end, Duration::from_millis(1500));
        assert_eq!(cues[1].start, Duration::from_millis(1500));
        assert_eq!(cues[1].text, "Second");
    }

    #[test]
    fn strips_cue_tags_keeps_entities() {
        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\n\
                   we<00:00:00.480><c> are</c><00:00:00.900><c> here</c> &amp; there\n";
        let cues = parse_vtt(vtt).unwrap();
        assert_eq!(cues[0].text, "we are here &amp; there");
    }

    #[test]
    fn skips_note_and_style_blocks() {
        let vtt = "WEBVTT\r\n\r\nNOTE a comment\r\n--> not a cue\r\n\r\n\
                   STYLE\r\n::cue { color: red }\r\n\r\n\
                   00:00:00.000 --> 00:00:01.000\r\nOnly cue\r\n";
        let cues = parse_vtt(vtt).unwrap();
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].text, "Only cue");
    }

    #[test]
    fn header_only_yields_no_cues() {
        assert!(parse_vtt("WEBVTT\n").unwrap().is_empty());
        assert!(parse_vtt("\u{feff}WEBVTT - title\n\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_header() {
        let err = parse_vtt("00:00:00.000 --> 00:00:01.000\nHi\n").unwrap_err();
        assert!(matches!(err, YtprepError::CaptionParse { .. }));
        assert!(parse_vtt("WEBVTTX\n").is_err());
    }

    #[test]
    fn rejects_bad_timing() {
        let err = parse_vtt("WEBVTT\n\n00:00:xx.000 --> 00:00:01.000\nHi\n").unwrap_err();
        assert!(err.to_string().contains("line 3"));
        assert!(parse_vtt("WEBVTT\n\njust text\n").is_err());
    }

    #[test]
    fn rejects_overflowing_hours() {
        let err = parse_vtt("WEBVTT\n\n18446744073709551615:00:00.000 --> 00:00:01.000\nHi\n")
            .unwrap_err();
        assert!(err.to_string().contains("invalid cue timing"));
        assert_eq!(
            parse_timestamp("5124095576030431:00:00.000"),
            None,
            "hours that fit u64 but overflow milliseconds"
        );
        assert_eq!(
            parse_timestamp("01:02:03.004"),
            Some(Duration::from_millis(3_723_004))
        );
    }

    #[test]
    fn whitespace_only_line_stays_inside_cue() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n\
                   00:00:00.000 --> 00:00:02.000 align:start position:0%\n \n\
                   hey<00:00:00.500><c> guys</c>\n\n\
                   00:00:02.000 --> 00:00:02.010 align:start position:0%\nhey guys\n \n\n\
                   00:00:02.010 --> 00:00:04.000 align:start position:0%\nhey guys\n\
                   what's<00:00:02.500><c> up</c>\n";
        let cues = parse_vtt(vtt).unwrap();
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].text, " \nhey guys");
        assert_eq!(cues[1].text, "hey guys\n ");
        assert_eq!(cues[2].text, "hey guys\nwhat's up");
    }

    #[test]
    fn unterminated_tag_is_kept() {
        assert_eq!(strip_tags("a < b"), "a < b");
        assert_eq!(strip_tags("<i>x</i>"), "x");
    }
}
