//! Heuristics that separate top-level posts from replies and page chrome.

/// Minimum body length, in characters, for a top-level post.
pub const MIN_POST_CHARS: usize = 40;

const REPLY_MARKERS: &[&str] = &["@", "…", "..."];

const REPLY_WORDS: &[&str] = &[
    "reply to",
    "thank you",
    "thanks",
    "same here",
    "agree",
    "yes",
    "no",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    TopLevel,
    Reply,
}

pub fn classify_body(text: &str) -> PostKind {
    let text = text.trim();
    if text.chars().count() < MIN_POST_CHARS || starts_with_reply_indicator(text) {
        PostKind::Reply
    } else {
        PostKind::TopLevel
    }
}

/// Leading mention markers, ellipses or acknowledgement words. Words only
/// match whole (`"No "` is a reply, `"Nobody"` is not).
pub fn starts_with_reply_indicator(text: &str) -> bool {
    let text = text.trim_start();
    if REPLY_MARKERS.iter().any(|marker| text.starts_with(marker)) {
        return true;
    }
    let lower = text.to_lowercase();
    REPLY_WORDS.iter().any(|word| {
        lower
            .strip_prefix(word)
            .is_some_and(|rest| rest.chars().next().is_none_or(|c| !c.is_alphanumeric()))
    })
}

/// Fragments that belong to the post header or footer rather than its body:
/// relative timestamps, neighbourhood separators, counters and the author's
/// own name.
pub fn is_metadata_fragment(fragment: &str, author: Option<&str>) -> bool {
    let fragment = fragment.trim();
    if fragment.chars().count() <= 3 {
        return true;
    }
    if author.is_some_and(|a| a == fragment) {
        return true;
    }
    if fragment.contains('·') {
        return true;
    }
    if fragment.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    fragment
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case("ago"))
}
