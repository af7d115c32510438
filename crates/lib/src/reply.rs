//! Reply formatting: turn raw model output into text an SMS gateway will accept.
//!
//! Output is printable ASCII only and bounded by a character and a word budget. Replies that come
//! out too short to be useful are replaced by [`FALLBACK_REPLY`].

use crate::config::{ReplyConfig, ReplyMode};

/// Sent instead of a reply that is empty or too short after trimming.
pub const FALLBACK_REPLY: &str = "Unable to generate a clear response.";

const MIN_REPLY_CHARS: usize = 10;
const MIN_REPLY_WORDS: usize = 5;

/// Number of whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Collapse each run of line breaks into one space and drop everything outside printable ASCII.
pub fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
            continue;
        }
        in_break = false;
        if (' '..='~').contains(&c) {
            out.push(c);
        }
    }
    out
}

/// Cut at the last space before `limit` until at most `max_words` remain. Stops when there is no space left to cut at.
/// `text` must be ASCII (see [`clean`]).
fn trim_words(text: &str, max_words: usize, limit: usize) -> &str {
    let mut result = text;
    while count_words(result) > max_words && !result.is_empty() {
        let end = result.len().min(limit);
        match result[..end].rfind(' ') {
            Some(i) => result = &result[..i],
            None => break,
        }
    }
    result
}

fn is_degenerate(reply: &str) -> bool {
    reply.len() < MIN_REPLY_CHARS || count_words(reply) < MIN_REPLY_WORDS
}

/// Single-message reply: at most `max_chars` characters and `max_words` words.
pub fn format_single(raw: &str, max_chars: usize, max_words: usize) -> String {
    let cleaned = clean(raw);
    let truncated = &cleaned[..cleaned.len().min(max_chars)];
    let reply = trim_words(truncated, max_words, max_chars).trim();
    if is_degenerate(reply) {
        FALLBACK_REPLY.to_string()
    } else {
        reply.to_string()
    }
}

/// Multi-part reply: successive parts of at most `segment_chars` characters and `max_words` words each, in delivery order.
///
/// Parts break on word boundaries where possible; a single token longer than the segment is hard-cut.
/// When every part is degenerate the whole reply is `[FALLBACK_REPLY]`.
pub fn format_multi(raw: &str, segment_chars: usize, max_words: usize) -> Vec<String> {
    let segment = segment_chars.max(1);
    let cleaned = clean(raw);
    let mut rest = cleaned.trim_start();
    let mut parts = Vec::new();

    while !rest.is_empty() {
        let mut end = rest.len().min(segment);
        if end < rest.len() {
            // A space right at the budget boundary still counts as a clean break.
            if let Some(i) = rest[..=end].rfind(' ') {
                if i > 0 {
                    end = i;
                }
            }
        }
        let chunk = trim_words(&rest[..end], max_words, segment);
        let consumed = if chunk.trim().is_empty() {
            end
        } else {
            chunk.len()
        };
        let part = chunk.trim_end();
        if !part.is_empty() {
            parts.push(part.to_string());
        }
        rest = rest[consumed..].trim_start();
    }

    if parts.iter().all(|p| is_degenerate(p)) {
        return vec![FALLBACK_REPLY.to_string()];
    }
    parts
}

/// Format according to the configured mode. Always returns at least one part.
pub fn format_reply(raw: &str, config: &ReplyConfig) -> Vec<String> {
    match config.mode {
        ReplyMode::Single => vec![format_single(raw, config.max_chars, config.max_words)],
        ReplyMode::Multi => format_multi(raw, config.segment_chars, config.max_words),
    }
}
