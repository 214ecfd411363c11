/// Consecutive empty rounds after which the feed is considered exhausted.
pub const DEFAULT_STALL_LIMIT: u32 = 3;

/// Counts consecutive scroll rounds that added no new posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StallTracker {
    limit: u32,
    consecutive: u32,
}

impl Default for StallTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_LIMIT)
    }
}

impl StallTracker {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            consecutive: 0,
        }
    }

    /// Records one round; returns `true` once the limit is reached.
    pub fn record(&mut self, added: usize) -> bool {
        if added == 0 {
            self.consecutive += 1;
        } else {
            self.consecutive = 0;
        }
        self.is_stalled()
    }

    pub fn is_stalled(&self) -> bool {
        self.consecutive >= self.limit
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}
