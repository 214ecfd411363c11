mod support;

use pretty_assertions::assert_eq;
use scout_engine::{ExtractorError, ExtractorSelectors, FeedPostExtractor, PostExtractor};
use support::{feed_page, post_card};

fn extractor() -> FeedPostExtractor {
    FeedPostExtractor::new(&ExtractorSelectors::default(), "https://nextdoor.com").unwrap()
}

#[test]
fn extracts_author_body_and_resolved_permalink() {
    let html = feed_page(&[post_card(
        "Maria Lopez",
        "Looking for a pool cleaner in Encino, weekly service preferred",
        "/p/abc123",
    )]);

    let posts = extractor().extract(&html);

    assert_eq!(posts.len(), 1);
    let post = &posts[0];
    assert_eq!(post.author, "Maria Lopez");
    assert_eq!(
        post.text,
        "Looking for a pool cleaner in Encino, weekly service preferred"
    );
    assert_eq!(post.url.as_deref(), Some("https://nextdoor.com/p/abc123"));
    assert_eq!(post.search_term, None);
}

#[test]
fn absolute_permalink_is_kept() {
    let html = feed_page(&[post_card(
        "Sam Lee",
        "Can anyone recommend a gutter cleaning company for a two story house",
        "https://nextdoor.com/p/xyz",
    )]);

    let posts = extractor().extract(&html);

    assert_eq!(posts[0].url.as_deref(), Some("https://nextdoor.com/p/xyz"));
}

#[test]
fn replies_and_short_bodies_are_skipped() {
    let html = feed_page(&[
        post_card("Ann Roe", "Thanks, I will give them a call tomorrow morning for sure", "/p/1"),
        post_card("Bo Diaz", "Same here, great service and very fair prices overall", "/p/2"),
        post_card("Cy Tan", "Call Joe, he is great", "/p/3"),
        post_card(
            "Di Fox",
            "Need a reliable exterminator for ants in the kitchen, any ideas?",
            "/p/4",
        ),
    ]);

    let posts = extractor().extract(&html);

    assert_eq!(
        posts.iter().map(|p| p.author.as_str()).collect::<Vec<_>>(),
        vec!["Di Fox"]
    );
}

#[test]
fn container_without_author_is_skipped_without_aborting_page() {
    let broken = r#"<div class="_7uk7474"><div data-block="22">
        <div class="blocks-1avh7al"><span data-testid="styled-text">An orphaned body without any author attached to it at all</span></div>
    </div></div>"#
        .to_string();
    let html = feed_page(&[
        broken,
        post_card(
            "Eve Park",
            "Looking for weekly lawn care in Sherman Oaks, small front yard",
            "/p/5",
        ),
    ]);

    let posts = extractor().extract(&html);

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].author, "Eve Park");
}

#[test]
fn container_without_card_marker_is_ignored() {
    let html = feed_page(&[r#"<div class="_7uk7474">
        <span data-testid="styled-text" style="detailTitle">Ghost Writer</span>
        <div class="blocks-1avh7al"><span data-testid="styled-text">This container has no card block so it is not a real post</span></div>
    </div>"#
        .to_string()]);

    assert!(extractor().extract(&html).is_empty());
}

#[test]
fn falls_back_to_later_content_block() {
    let html = feed_page(&[r#"<div class="_7uk7474"><div data-block="22">
        <span data-testid="styled-text" style="detailTitle">Gil Stone</span>
        <div class="blocks-1avh7al"><span data-testid="styled-text">2h ago</span></div>
        <div class="blocks-1q6x145"><span data-testid="styled-text">Who does window washing for second floor windows around here?</span></div>
    </div></div>"#
        .to_string()]);

    let posts = extractor().extract(&html);

    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].text,
        "Who does window washing for second floor windows around here?"
    );
    assert_eq!(posts[0].url, None);
}

#[test]
fn missing_main_content_yields_nothing() {
    let html = format!(
        "<html><body>{}</body></html>",
        post_card(
            "Hal Moss",
            "Looking for house cleaning every other week in Tarzana area",
            "/p/6"
        )
    );

    assert!(extractor().extract(&html).is_empty());
}

#[test]
fn bad_selector_is_a_configuration_error() {
    let selectors = ExtractorSelectors {
        card: "div[[".to_string(),
        ..ExtractorSelectors::default()
    };

    let err = FeedPostExtractor::new(&selectors, "https://nextdoor.com").unwrap_err();

    assert!(matches!(err, ExtractorError::Selector { .. }));
}
