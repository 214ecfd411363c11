//! Scroll-driven collection of posts from an infinite feed.

use scout_core::{DedupSet, Post, StallTracker, DEFAULT_STALL_LIMIT};
use scout_logging::{scout_debug, scout_info, scout_warn};

use crate::driver::{BrowserDriver, DriverError};
use crate::extract::PostExtractor;
use crate::overlays::dismiss_overlays;
use crate::pacing::Pacer;

pub const DEFAULT_MAX_ROUNDS: u32 = 20;

const SCROLL_HEIGHT_SCRIPT: &str = "return document.body.scrollHeight;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundEnd {
    Continue,
    Stalled,
    Bottom,
    LastRound,
}

#[derive(Default)]
struct Collected {
    seen: DedupSet,
    posts: Vec<Post>,
}

pub struct ScrollCollector<'a> {
    driver: &'a dyn BrowserDriver,
    extractor: &'a dyn PostExtractor,
    pacer: &'a Pacer,
    stall_limit: u32,
}

impl<'a> ScrollCollector<'a> {
    pub fn new(
        driver: &'a dyn BrowserDriver,
        extractor: &'a dyn PostExtractor,
        pacer: &'a Pacer,
    ) -> Self {
        Self {
            driver,
            extractor,
            pacer,
            stall_limit: DEFAULT_STALL_LIMIT,
        }
    }

    pub fn with_stall_limit(mut self, limit: u32) -> Self {
        self.stall_limit = limit;
        self
    }

    /// Scrolls and extracts until the feed stalls, the bottom is confirmed,
    /// or `max_rounds` rounds have run.
    ///
    /// A driver error in the first round fails the collection. Later errors
    /// end it early with whatever was already collected.
    pub async fn collect(&self, max_rounds: u32) -> Result<Vec<Post>, DriverError> {
        let mut collected = Collected::default();
        let mut stall = StallTracker::new(self.stall_limit);

        for round in 1..=max_rounds {
            match self
                .round(round, max_rounds, &mut collected, &mut stall)
                .await
            {
                Ok(RoundEnd::Continue) => {}
                Ok(end) => {
                    scout_info!("Collection finished after round {} ({:?})", round, end);
                    break;
                }
                Err(err) if round == 1 => return Err(err),
                Err(err) => {
                    scout_warn!(
                        "Collection stopped in round {}: {}; keeping {} posts",
                        round,
                        err,
                        collected.posts.len()
                    );
                    break;
                }
            }
        }
        Ok(collected.posts)
    }

    async fn round(
        &self,
        round: u32,
        max_rounds: u32,
        collected: &mut Collected,
        stall: &mut StallTracker,
    ) -> Result<RoundEnd, DriverError> {
        let height = self.scroll_height().await?;
        let html = self.driver.page_source().await?;

        let mut added = 0;
        for mut post in self.extractor.extract(&html) {
            if collected.seen.insert(&post) {
                post.round = round;
                collected.posts.push(post);
                added += 1;
            }
        }
        scout_info!(
            "Round {}: {} new posts, {} total",
            round,
            added,
            collected.posts.len()
        );

        if stall.record(added) {
            return Ok(RoundEnd::Stalled);
        }
        if round >= max_rounds {
            return Ok(RoundEnd::LastRound);
        }

        let settings = self.pacer.settings();
        let amount = self.pacer.scroll_amount();
        self.driver.scroll_by(amount).await?;
        self.pacer.pause(settings.scroll_wait).await;

        let grown = self.scroll_height().await?;
        if grown == height {
            scout_debug!("Page height unchanged at {}, checking again", height);
            self.pacer.pause(settings.confirm_wait).await;
            self.driver.scroll_by(amount).await?;
            self.pacer.pause(settings.confirm_wait).await;
            if self.scroll_height().await? == grown {
                return Ok(RoundEnd::Bottom);
            }
        }

        dismiss_overlays(self.driver, self.pacer).await;
        Ok(RoundEnd::Continue)
    }

    async fn scroll_height(&self) -> Result<i64, DriverError> {
        let value = self
            .driver
            .run_script(SCROLL_HEIGHT_SCRIPT, Vec::new())
            .await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|h| h as i64))
            .ok_or_else(|| DriverError::Protocol(format!("scroll height is not a number: {value}")))
    }
}
