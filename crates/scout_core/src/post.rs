use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Number of normalized characters that identify a post for deduplication.
pub const DEDUP_KEY_CHARS: usize = 50;

/// A top-level feed post discovered during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    /// Scroll round (1-based) in which the collector first saw the post.
    #[serde(default)]
    pub round: u32,
}

impl Post {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            url: None,
            search_term: None,
            round: 0,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn dedup_key(&self) -> String {
        dedup_key(&self.text)
    }
}

/// `lowercase(strip(text))[:50]`, counted in characters.
pub fn dedup_key(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .chars()
        .take(DEDUP_KEY_CHARS)
        .collect()
}

/// Order-preserving, first-seen-wins deduplication by [`dedup_key`].
pub fn dedupe(posts: Vec<Post>) -> Vec<Post> {
    let mut seen = DedupSet::default();
    posts.into_iter().filter(|post| seen.insert(post)).collect()
}

/// Set of dedup keys already observed.
#[derive(Debug, Clone, Default)]
pub struct DedupSet {
    keys: HashSet<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the post's key was not seen before.
    pub fn insert(&mut self, post: &Post) -> bool {
        self.keys.insert(post.dedup_key())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
