use std::fmt;

use scout_logging::scout_debug;
use serde::Deserialize;

use crate::driver::{BrowserDriver, DriverError, ElementHandle};

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
    /// Element of `tag` whose normalized text contains `text`.
    Text { tag: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// W3C WebDriver `(using, value)` pair.
    pub fn to_webdriver(&self) -> (&'static str, String) {
        match self {
            Locator::Css(selector) => ("css selector", selector.clone()),
            Locator::XPath(expr) => ("xpath", expr.clone()),
            Locator::Text { tag, text } => ("xpath", text_xpath(tag, text)),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(selector) => write!(f, "css={selector}"),
            Locator::XPath(expr) => write!(f, "xpath={expr}"),
            Locator::Text { tag, text } => write!(f, "text={tag}:{text:?}"),
        }
    }
}

fn text_xpath(tag: &str, text: &str) -> String {
    let literal = if text.contains('"') {
        format!("'{text}'")
    } else {
        format!("\"{text}\"")
    };
    format!("//{tag}[contains(normalize-space(.), {literal})]")
}

/// An element together with the strategy that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub element: ElementHandle,
    pub locator: Locator,
}

/// Tries `strategies` in order; the first match wins.
///
/// A strategy that errors (bad selector, stale page) is treated like a miss so
/// that the chain keeps going; `None` means the list was exhausted.
pub async fn find_first(driver: &dyn BrowserDriver, strategies: &[Locator]) -> Option<Located> {
    for locator in strategies {
        match driver.locate(locator).await {
            Ok(Some(element)) => {
                scout_debug!("Located element with {}", locator);
                return Some(Located {
                    element,
                    locator: locator.clone(),
                });
            }
            Ok(None) => continue,
            Err(err) => {
                scout_debug!("Locator {} failed: {}", locator, err);
                continue;
            }
        }
    }
    None
}

/// Like [`find_first`] but only accepts elements that are currently displayed.
pub async fn find_first_displayed(
    driver: &dyn BrowserDriver,
    strategies: &[Locator],
) -> Option<Located> {
    for locator in strategies {
        let element = match driver.locate(locator).await {
            Ok(Some(element)) => element,
            Ok(None) => continue,
            Err(err) => {
                scout_debug!("Locator {} failed: {}", locator, err);
                continue;
            }
        };
        if driver.is_displayed(&element).await.unwrap_or(false) {
            scout_debug!("Located visible element with {}", locator);
            return Some(Located {
                element,
                locator: locator.clone(),
            });
        }
    }
    None
}

/// Displayed elements matching `locator`, ordered by their `id` attribute.
pub async fn displayed_sorted_by_id(
    driver: &dyn BrowserDriver,
    locator: &Locator,
) -> Result<Vec<ElementHandle>, DriverError> {
    let mut keyed = Vec::new();
    for element in driver.locate_all(locator).await? {
        if !driver.is_displayed(&element).await? {
            continue;
        }
        let id = driver.attribute(&element, "id").await?.unwrap_or_default();
        keyed.push((id, element));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, element)| element).collect())
}
