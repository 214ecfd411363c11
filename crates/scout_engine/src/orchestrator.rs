use scout_core::{dedupe, Post, ScanResult, TermOutcome, TermStatus};
use scout_logging::{scout_info, scout_warn};

use crate::collector::{ScrollCollector, DEFAULT_MAX_ROUNDS};
use crate::driver::BrowserDriver;
use crate::extract::PostExtractor;
use crate::navigator::PageNavigator;
use crate::overlays::dismiss_overlays;
use crate::pacing::Pacer;
use crate::sink::{DeliveryReport, ResultSink, SinkError};
use crate::site::SiteSettings;

/// What a scan produced. A delivery failure never hides the collected posts.
#[derive(Debug)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub delivery: Result<DeliveryReport, SinkError>,
}

pub struct SearchOrchestrator<'a> {
    driver: &'a dyn BrowserDriver,
    site: &'a SiteSettings,
    pacer: &'a Pacer,
    extractor: &'a dyn PostExtractor,
    sink: &'a dyn ResultSink,
    max_rounds: u32,
}

impl<'a> SearchOrchestrator<'a> {
    pub fn new(
        driver: &'a dyn BrowserDriver,
        site: &'a SiteSettings,
        pacer: &'a Pacer,
        extractor: &'a dyn PostExtractor,
        sink: &'a dyn ResultSink,
    ) -> Self {
        Self {
            driver,
            site,
            pacer,
            extractor,
            sink,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Searches every term in order, then hands the combined result to the sink.
    /// A failing term contributes nothing and the scan moves on.
    pub async fn run(&self, terms: &[String]) -> ScanOutcome {
        let mut accumulated = Vec::new();
        let mut outcomes = Vec::with_capacity(terms.len());

        for (index, term) in terms.iter().enumerate() {
            if index > 0 {
                scout_info!("Backing off before the next search");
                self.pacer.pause(self.pacer.settings().inter_term).await;
                dismiss_overlays(self.driver, self.pacer).await;
            }
            scout_info!("Search {}/{}: {:?}", index + 1, terms.len(), term);

            let status = match self.run_term(term).await {
                Ok(posts) => {
                    scout_info!("Found {} posts for {:?}", posts.len(), term);
                    let found = posts.len();
                    accumulated.extend(posts);
                    TermStatus::Completed { found }
                }
                Err(status) => status,
            };
            outcomes.push(TermOutcome {
                term: term.clone(),
                status,
            });
        }

        let result = ScanResult::new(accumulated, outcomes);
        scout_info!("Total unique posts across all searches: {}", result.len());
        let delivery = self.sink.deliver(&result).await;
        ScanOutcome { result, delivery }
    }

    async fn run_term(&self, term: &str) -> Result<Vec<Post>, TermStatus> {
        PageNavigator::new(self.driver, self.site, self.pacer)
            .search(term)
            .await
            .map_err(|err| {
                scout_warn!("Search for {:?} failed: {}", term, err);
                TermStatus::NavigationFailed(err.to_string())
            })?;
        self.pacer.pause(self.pacer.settings().before_collect).await;

        let posts = ScrollCollector::new(self.driver, self.extractor, self.pacer)
            .collect(self.max_rounds)
            .await
            .map_err(|err| {
                scout_warn!("Collecting {:?} failed: {}", term, err);
                TermStatus::CollectionFailed(err.to_string())
            })?;

        let mut posts = dedupe(posts);
        for post in &mut posts {
            post.search_term = Some(term.to_string());
        }
        Ok(posts)
    }
}
