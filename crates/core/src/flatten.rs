//! Caption track flattening.
//!
//! Caption tracks (especially auto-generated ones) re-display the trailing
//! line of the previous cue as a scrolling effect. Flattening keeps every
//! line once per run: immediately repeated lines collapse, repeats further
//! apart are kept.

use std::borrow::Cow;

use quick_xml::escape::unescape_with;

use crate::{error::Result, vtt::CaptionCue, vtt::parse_vtt};

/// Upper bound on `&name;` length considered an entity reference.
const MAX_ENTITY_LEN: usize = 32;

/// Ordered, deduplicated transcript lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedTranscript {
    lines: Vec<String>,
}

impl FlattenedTranscript {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

pub fn flatten_cues(cues: &[CaptionCue]) -> FlattenedTranscript {
    let mut lines: Vec<String> = Vec::new();

    for cue in cues {
        for line in cue.text.lines() {
            let stripped = line.trim();
            if stripped.is_empty() {
                continue;
            }

            let decoded = decode_entities(stripped);
            // Also drops whitespace produced by decoding, e.g. a trailing `&nbsp;`.
            let decoded = decoded.trim();
            if decoded.is_empty() {
                continue;
            }

            if lines.last().map(String::as_str) != Some(decoded) {
                lines.push(decoded.to_string());
            }
        }
    }

    FlattenedTranscript { lines }
}

/// Parse a WebVTT payload and flatten it.
pub fn flatten_vtt(raw: &str) -> Result<FlattenedTranscript> {
    let cues = parse_vtt(raw)?;
    Ok(flatten_cues(&cues))
}

/// Decode HTML character references. Unknown names and stray `&` stay as-is.
pub fn decode_entities(line: &str) -> Cow<'_, str> {
    if !line.contains('&') {
        return Cow::Borrowed(line);
    }

    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let reference = tail
            .char_indices()
            .skip(1)
            .take(MAX_ENTITY_LEN)
            .take_while(|&(_, c)| c != '&' && !c.is_whitespace())
            .find(|&(_, c)| c == ';')
            .map(|(semi, _)| &tail[..=semi]);

        match reference {
            Some(reference) => {
                match unescape_with(reference, resolve_html_entity) {
                    Ok(decoded) => out.push_str(&decoded),
                    Err(_) => out.push_str(reference),
                }
                rest = &tail[reference.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

fn resolve_html_entity(name: &str) -> Option<&'static str> {
    let resolved = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "lrm" => "\u{200e}",
        "rlm" => "\u{200f}",
        "hellip" => "\u{2026}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{b0}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "cent" => "\u{a2}",
        "yen" => "\u{a5}",
        "sect" => "\u{a7}",
        "para" => "\u{b6}",
        "iexcl" => "\u{a1}",
        "iquest" => "\u{bf}",
        "eacute" => "\u{e9}",
        "egrave" => "\u{e8}",
        "aacute" => "\u{e1}",
        "agrave" => "\u{e0}",
        "ntilde" => "\u{f1}",
        "ouml" => "\u{f6}",
        "uuml" => "\u{fc}",
        "auml" => "\u{e4}",
        "szlig" => "\u{df}",
        "ccedil" => "\u{e7}",
        _ => return None,
    };
    Some(resolved)
}
