//! Where the target site lives and how to find things on it.
//!
//! Every selector is a list of [`Locator`]s tried in order. The defaults
//! reflect the markup observed on the target feed; all of them can be
//! overridden from configuration when the markup drifts.

use serde::Deserialize;

use crate::locator::Locator;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub feed_url: String,
    pub login_url: String,
    /// Base used to resolve relative post permalinks.
    pub base_url: String,
    pub feed_marker: String,
    pub login_marker: String,
    pub challenge_paths: Vec<String>,
    pub challenge_phrases: Vec<String>,

    pub username_field: Vec<Locator>,
    pub password_field: Vec<Locator>,
    pub login_submit: Vec<Locator>,
    pub challenge_fields: Vec<Locator>,
    /// All per-digit code inputs; sorted by `id` to recover digit order.
    pub digit_fields: Locator,
    /// Single input taking the whole code, used when no digit fields show.
    pub single_code_field: Vec<Locator>,
    pub code_submit: Vec<Locator>,
    pub logged_in_signals: Vec<Locator>,
    pub save_password_dismiss: Vec<Locator>,

    pub search_input: Vec<Locator>,
    pub search_submit: Vec<Locator>,
    pub posts_tab: Vec<Locator>,
    pub time_filter_fallback: Vec<Locator>,
    /// Visible label of the time-scope control before filtering.
    pub time_filter_label: String,
    pub time_scope_option: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            feed_url: "https://nextdoor.com/news_feed/".to_string(),
            login_url: "https://nextdoor.com/login/".to_string(),
            base_url: "https://nextdoor.com".to_string(),
            feed_marker: "news_feed".to_string(),
            login_marker: "login".to_string(),
            challenge_paths: strings(&["/verify", "/2fa", "/authenticate"]),
            challenge_phrases: strings(&[
                "enter the verification code",
                "enter your verification code",
                "security code",
                "authentication code",
                "verify your account",
            ]),

            username_field: css(&[
                r#"input[type="email"]"#,
                r#"input[name="email"]"#,
                "#email",
                r#"input[placeholder*="email"]"#,
            ]),
            password_field: css(&[
                r#"input[type="password"]"#,
                r#"input[name="password"]"#,
                "#password",
                r#"input[placeholder*="password"]"#,
            ]),
            login_submit: vec![
                Locator::css(r#"button[type="submit"]"#),
                Locator::css(r#"input[type="submit"]"#),
                Locator::text("button", "Log in"),
                Locator::text("button", "Sign in"),
                Locator::css(r#"[data-testid="login-button"]"#),
            ],
            challenge_fields: css(&[
                r#"input[type="text"][placeholder*="code"]"#,
                r#"input[placeholder*="verification"]"#,
                r#"input[placeholder*="security"]"#,
                r#"input[name*="code"]"#,
                r#"input[name*="verify"]"#,
                r#"form[action*="verify"]"#,
                r#"div[class*="verification"]"#,
                r#"div[class*="2fa"]"#,
            ]),
            digit_fields: Locator::css(r#"input[id^="_r"][id$="_"]"#),
            single_code_field: css(&[
                r#"input[autocomplete="one-time-code"]"#,
                r#"input[name*="code"]"#,
            ]),
            code_submit: vec![
                Locator::text("button", "Login"),
                Locator::text("button", "Continue"),
                Locator::text("button", "Submit"),
                Locator::css(r#"button[type="submit"]"#),
                Locator::css(r#"input[type="submit"]"#),
            ],
            logged_in_signals: css(&[
                r#"div[data-test-id*="search"]"#,
                r#"button[aria-label*="menu"]"#,
                r#"input[placeholder*="search"]"#,
                "nav",
                "header",
            ]),
            save_password_dismiss: vec![
                Locator::text("button", "Not now"),
                Locator::text("button", "No thanks"),
                Locator::text("button", "Never"),
                Locator::css(r#"[data-testid="password-save-dismiss"]"#),
                Locator::css(".password-save-dismiss"),
                Locator::css(r#"button[aria-label*="dismiss"]"#),
                Locator::css(r#"button[aria-label*="not now"]"#),
            ],

            search_input: css(&[
                "#search-input-field",
                r#"input[aria-label="Search Nextdoor"]"#,
                r#"input[placeholder*="Search"]"#,
                r#"input[placeholder*="search"]"#,
                r#"input[type="search"]"#,
                r#"[data-testid="search-input"]"#,
                ".search-input",
                r#"input[name="search"]"#,
                "#search",
                r#"input[aria-label*="Search"]"#,
            ]),
            search_submit: vec![
                Locator::css(r#"button[aria-label*="Search"]"#),
                Locator::css(r#"[data-testid="search-button"]"#),
                Locator::css(".search-button"),
                Locator::text("button", "Search"),
            ],
            posts_tab: vec![
                Locator::css(r#"[data-testid="tab-posts"]"#),
                Locator::css(r#"a[role="tab"][aria-controls*="posts-panel"]"#),
                Locator::css(r#"[href*="/search/posts/"]"#),
                Locator::text("a", "Posts"),
            ],
            time_filter_fallback: vec![
                Locator::css(r#"button:has(svg[data-icon="calendar"])"#),
                Locator::text("button", "All Time"),
            ],
            time_filter_label: "All Time".to_string(),
            time_scope_option: "Today".to_string(),
        }
    }
}

impl SiteSettings {
    /// On the feed and not bounced to the login page.
    pub fn is_feed_location(&self, url: &str) -> bool {
        url.contains(&self.feed_marker) && !url.contains(&self.login_marker)
    }

    pub fn is_login_location(&self, url: &str) -> bool {
        url.contains(&self.login_marker)
    }

    pub fn is_challenge_location(&self, url: &str) -> bool {
        let url = url.to_lowercase();
        self.challenge_paths.iter().any(|path| url.contains(path.as_str()))
    }

    /// First challenge phrase found in `text`, compared case-insensitively.
    pub fn challenge_phrase_in<'a>(&'a self, text: &str) -> Option<&'a str> {
        let text = text.to_lowercase();
        self.challenge_phrases
            .iter()
            .find(|phrase| text.contains(&phrase.to_lowercase()))
            .map(String::as_str)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn css(selectors: &[&str]) -> Vec<Locator> {
    selectors.iter().map(|s| Locator::css(*s)).collect()
}
