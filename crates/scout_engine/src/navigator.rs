use scout_logging::{scout_debug, scout_info, scout_warn};
use serde_json::Value;
use thiserror::Error;

use crate::driver::{BrowserDriver, DriverError, ENTER_KEY};
use crate::locator::find_first;
use crate::pacing::Pacer;
use crate::site::SiteSettings;

const OPEN_TIME_FILTER_SCRIPT: &str = r#"
var label = arguments[0];
var spans = document.querySelectorAll('span');
for (var i = 0; i < spans.length; i++) {
    if (spans[i].textContent.includes(label)) {
        var button = spans[i].closest('.BaseButton__emelwr2')
            || spans[i].closest('div[data-part="button"]')
            || spans[i].closest('button');
        if (button) { button.click(); return true; }
    }
}
return false;
"#;

const PICK_OPTION_SCRIPT: &str = r#"
var label = arguments[0];
var elements = document.querySelectorAll('span, div, button, li');
for (var i = 0; i < elements.length; i++) {
    if (elements[i].textContent.trim() === label) {
        elements[i].click();
        return true;
    }
}
return false;
"#;

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("search input not found")]
    SearchInputNotFound,
    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Which best-effort filters were applied after a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationReport {
    pub posts_tab: bool,
    pub time_scope: bool,
}

pub struct PageNavigator<'a> {
    driver: &'a dyn BrowserDriver,
    site: &'a SiteSettings,
    pacer: &'a Pacer,
}

impl<'a> PageNavigator<'a> {
    pub fn new(driver: &'a dyn BrowserDriver, site: &'a SiteSettings, pacer: &'a Pacer) -> Self {
        Self {
            driver,
            site,
            pacer,
        }
    }

    /// Runs a search for `term` and narrows the results to today's posts.
    ///
    /// Only a missing search input or a failure while entering the query is
    /// an error; the result filters are applied when they can be found.
    pub async fn search(&self, term: &str) -> Result<NavigationReport, NavigationError> {
        scout_info!("Searching for {:?}", term);
        self.pacer.pause(self.pacer.settings().before_search).await;

        let input = find_first(self.driver, &self.site.search_input)
            .await
            .ok_or(NavigationError::SearchInputNotFound)?;
        self.driver.click(&input.element).await?;
        self.pacer.think().await;
        self.pacer
            .type_text(self.driver, &input.element, term)
            .await?;
        self.pacer.think().await;

        match find_first(self.driver, &self.site.search_submit).await {
            Some(submit) => {
                scout_debug!("Submitting search via {}", submit.locator);
                self.driver.click(&submit.element).await?;
            }
            None => {
                scout_debug!("No search button found, pressing Enter");
                self.driver.send_keys(&input.element, ENTER_KEY).await?;
            }
        }
        self.pacer.pause(self.pacer.settings().after_search).await;
        if let Ok(url) = self.driver.current_url().await {
            scout_debug!("After search: {}", url);
        }

        let report = NavigationReport {
            posts_tab: self.select_posts_tab().await,
            time_scope: self.select_time_scope().await,
        };
        scout_info!(
            "Search {:?} ready (posts tab: {}, time scope: {})",
            term,
            report.posts_tab,
            report.time_scope
        );
        Ok(report)
    }

    async fn select_posts_tab(&self) -> bool {
        let Some(tab) = find_first(self.driver, &self.site.posts_tab).await else {
            scout_warn!("Posts tab not found");
            return false;
        };
        match self.driver.click(&tab.element).await {
            Ok(()) => {
                self.pacer.pause(self.pacer.settings().after_filter).await;
                true
            }
            Err(err) => {
                scout_warn!("Could not click posts tab: {}", err);
                false
            }
        }
    }

    async fn select_time_scope(&self) -> bool {
        if !self.open_time_filter().await {
            scout_warn!("Time filter control not found");
            return false;
        }
        self.pacer.pause(self.pacer.settings().after_filter).await;

        let label = &self.site.time_scope_option;
        if !self.script_flag(PICK_OPTION_SCRIPT, label).await {
            scout_warn!("Time scope option {:?} not found", label);
            return false;
        }
        self.pacer.pause(self.pacer.settings().after_filter).await;
        true
    }

    async fn open_time_filter(&self) -> bool {
        if self
            .script_flag(OPEN_TIME_FILTER_SCRIPT, &self.site.time_filter_label)
            .await
        {
            return true;
        }
        let Some(control) = find_first(self.driver, &self.site.time_filter_fallback).await else {
            return false;
        };
        self.driver.click(&control.element).await.is_ok()
    }

    async fn script_flag(&self, script: &str, label: &str) -> bool {
        match self
            .driver
            .run_script(script, vec![Value::from(label)])
            .await
        {
            Ok(value) => value.as_bool().unwrap_or(false),
            Err(err) => {
                scout_debug!("Filter script failed: {}", err);
                false
            }
        }
    }
}
