use crate::Post;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermStatus {
    /// The term ran to completion; `found` unique posts after per-term dedup.
    Completed { found: usize },
    NavigationFailed(String),
    CollectionFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermOutcome {
    pub term: String,
    pub status: TermStatus,
}

impl TermOutcome {
    pub fn contributed(&self) -> usize {
        match self.status {
            TermStatus::Completed { found } => found,
            _ => 0,
        }
    }
}

/// Deduplicated posts of one run, in discovery order. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanResult {
    posts: Vec<Post>,
    terms: Vec<TermOutcome>,
}

impl ScanResult {
    /// Builds the result; `posts` is deduplicated again on the way in.
    pub fn new(posts: Vec<Post>, terms: Vec<TermOutcome>) -> Self {
        Self {
            posts: crate::dedupe(posts),
            terms,
        }
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn term_outcomes(&self) -> &[TermOutcome] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.posts
    }
}
