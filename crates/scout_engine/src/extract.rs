//! Pulls top-level posts out of a rendered feed page.

use scout_core::{classify_body, is_metadata_fragment, Post, PostKind};
use scout_logging::scout_debug;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
    #[error("invalid base url {0:?}")]
    BaseUrl(String),
}

pub trait PostExtractor: Send + Sync {
    /// Best effort: malformed containers are skipped, never fatal.
    fn extract(&self, html: &str) -> Vec<Post>;
}

/// CSS selectors describing the feed markup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractorSelectors {
    pub main_content: String,
    /// Tried in order; the first selector matching anything is used.
    pub containers: Vec<String>,
    /// A container without this marker is not a post card. Empty disables it.
    pub card: String,
    pub permalink: String,
    pub styled_text: String,
    /// Substring of the `style` attribute that marks the author span.
    pub author_style: String,
    pub content_blocks: Vec<String>,
}

impl Default for ExtractorSelectors {
    fn default() -> Self {
        Self {
            main_content: "div#main_content".to_string(),
            containers: vec![
                "div._7uk7474".to_string(),
                r#"[role="article"]"#.to_string(),
            ],
            card: r#"div[data-block="22"]"#.to_string(),
            permalink: r#"a[data-block="17"]"#.to_string(),
            styled_text: r#"span[data-testid="styled-text"]"#.to_string(),
            author_style: "detailTitle".to_string(),
            content_blocks: vec![
                "div.blocks-1avh7al".to_string(),
                "div.blocks-1q6x145".to_string(),
                r#"div[class*="Styled_marginRight-sm__zpop7kx"]"#.to_string(),
            ],
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractorError> {
    Selector::parse(selector).map_err(|err| ExtractorError::Selector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub struct FeedPostExtractor {
    main_content: Selector,
    containers: Vec<Selector>,
    card: Option<Selector>,
    permalink: Selector,
    styled_text: Selector,
    author_style: String,
    content_blocks: Vec<Selector>,
    base_url: Url,
}

impl FeedPostExtractor {
    /// Compiles the selectors once; a bad selector is a configuration error.
    pub fn new(selectors: &ExtractorSelectors, base_url: &str) -> Result<Self, ExtractorError> {
        let base_url =
            Url::parse(base_url).map_err(|_| ExtractorError::BaseUrl(base_url.to_string()))?;
        let card = if selectors.card.trim().is_empty() {
            None
        } else {
            Some(parse_selector(&selectors.card)?)
        };
        Ok(Self {
            main_content: parse_selector(&selectors.main_content)?,
            containers: selectors
                .containers
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            card,
            permalink: parse_selector(&selectors.permalink)?,
            styled_text: parse_selector(&selectors.styled_text)?,
            author_style: selectors.author_style.clone(),
            content_blocks: selectors
                .content_blocks
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            base_url,
        })
    }

    fn containers<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        for selector in &self.containers {
            let found: Vec<_> = root.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    fn permalink(&self, container: ElementRef<'_>) -> Option<String> {
        let href = container
            .select(&self.permalink)
            .find_map(|a| a.value().attr("href"))?
            .trim();
        if href.is_empty() {
            return None;
        }
        self.base_url.join(href).ok().map(String::from)
    }

    fn author(&self, container: ElementRef<'_>) -> Option<String> {
        container
            .select(&self.styled_text)
            .filter(|span| {
                span.value()
                    .attr("style")
                    .is_some_and(|style| style.contains(&self.author_style))
            })
            .map(stripped_text)
            .find(|text| (3..50).contains(&text.chars().count()))
    }

    fn body(&self, container: ElementRef<'_>, author: &str) -> Option<String> {
        self.content_blocks.iter().find_map(|selector| {
            let block = container.select(selector).next()?;
            let parts: Vec<String> = block
                .select(&self.styled_text)
                .map(stripped_text)
                .filter(|text| !is_metadata_fragment(text, Some(author)))
                .collect();
            (!parts.is_empty()).then(|| parts.join(" "))
        })
    }

    fn post_from(&self, container: ElementRef<'_>) -> Option<Post> {
        if let Some(card) = &self.card {
            container.select(card).next()?;
        }
        let author = self.author(container)?;
        let body = self.body(container, &author)?;
        if classify_body(&body) == PostKind::Reply {
            scout_debug!(
                "Skipped reply by {}: {}",
                author,
                body.chars().take(30).collect::<String>()
            );
            return None;
        }
        let post = Post::new(body, author);
        Some(match self.permalink(container) {
            Some(url) => post.with_url(url),
            None => post,
        })
    }
}

/// Text of an element with each text node trimmed and concatenated.
fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

impl PostExtractor for FeedPostExtractor {
    fn extract(&self, html: &str) -> Vec<Post> {
        let doc = Html::parse_document(html);
        let Some(main) = doc.select(&self.main_content).next() else {
            scout_debug!("Main content area not found");
            return Vec::new();
        };
        let containers = self.containers(main);
        scout_debug!("Found {} candidate post containers", containers.len());
        containers
            .into_iter()
            .filter_map(|container| self.post_from(container))
            .collect()
    }
}
