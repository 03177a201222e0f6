//! Question content parsing.
//!
//! Splits a question's raw text into a stem and labeled answer options.
//! Purely lexical: no image access, no layout information beyond the text
//! itself.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::domain::QuestionOption;

/// Per-line noise inside a question body (seal lines, page footers, header
/// fields that survived line classification).
static NOISE_LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        "弥封线|密封线|装订线|答题卡|考生须知|注意事项|姓名|班级|学校|考号|不要答题|第.*页|共.*页",
    )
    .expect("noise line pattern must compile")
});

/// Option letter followed by a separator: "A." "B、" "C："
static MARKER_WITH_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Da-d])[.、．:：]\s*").expect("marker pattern must compile"));

/// Option letter set off by whitespace alone: " A 选项内容"
static MARKER_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)([A-Da-d])\s+").expect("marker pattern must compile"));

/// An option marker found in the cleaned text, as byte offsets.
#[derive(Debug, Clone, Copy)]
struct Marker {
    label: char,
    /// Where the marker (including any leading whitespace the matcher
    /// consumed) begins; the previous region ends here.
    start: usize,
    /// Where the option body begins.
    content_start: usize,
}

/// Stem and options extracted from a question's text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedContent {
    /// Body text preceding the first option marker, or the whole cleaned
    /// text when no options were found.
    pub stem: String,
    /// Options sorted by label, labels uppercased and deduplicated.
    pub options: Vec<QuestionOption>,
}

/// Parses question text into stem and options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentParser;

impl ContentParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses `text` (newline-separated lines) into a [`ParsedContent`].
    ///
    /// Marker templates are tried in order and the first yielding at least
    /// two markers wins; fewer than two matches is treated as prose that
    /// merely mentions a letter, and the whole text becomes the stem.
    pub fn parse(&self, text: &str) -> ParsedContent {
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return ParsedContent::default();
        }

        let markers = find_markers(&cleaned);
        if markers.len() < 2 {
            return ParsedContent {
                stem: cleaned,
                options: Vec::new(),
            };
        }

        let stem = cleaned[..markers[0].start].trim().to_string();
        let mut options: Vec<QuestionOption> = Vec::with_capacity(markers.len());
        for (i, marker) in markers.iter().enumerate() {
            let end = markers
                .get(i + 1)
                .map(|next| next.start)
                .unwrap_or(cleaned.len());
            let content = cleaned[marker.content_start..end].trim();
            if content.is_empty() {
                trace!(label = %marker.label, "empty option body skipped");
                continue;
            }
            let label = marker.label.to_ascii_uppercase();
            if options.iter().any(|option| option.label == label) {
                continue;
            }
            options.push(QuestionOption {
                label,
                content: content.to_string(),
            });
        }
        options.sort_by_key(|option| option.label);

        ParsedContent { stem, options }
    }
}

/// Drops noise lines and joins the rest with single spaces.
fn clean_text(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !NOISE_LINE_PATTERN.is_match(line))
        .collect();
    kept.join(" ")
}

/// Finds option markers, trying each template in order.
fn find_markers(cleaned: &str) -> Vec<Marker> {
    let with_separator: Vec<Marker> = MARKER_WITH_SEPARATOR
        .captures_iter(cleaned)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let letter = captures.get(1)?;
            Some(Marker {
                label: letter.as_str().chars().next()?,
                start: whole.start(),
                content_start: whole.end(),
            })
        })
        .collect();
    if with_separator.len() >= 2 {
        return with_separator;
    }

    // The bare template needs a non-letter after the gap so that words like
    // "a big" are not read as option "a".
    let bare: Vec<Marker> = MARKER_BARE
        .captures_iter(cleaned)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let letter = captures.get(1)?;
            let next = cleaned[whole.end()..].chars().next()?;
            if next.is_ascii_alphabetic() {
                return None;
            }
            Some(Marker {
                label: letter.as_str().chars().next()?,
                start: whole.start(),
                content_start: whole.end(),
            })
        })
        .collect();
    if bare.len() >= 2 {
        return bare;
    }

    Vec::new()
}
