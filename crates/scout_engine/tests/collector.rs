mod support;

use pretty_assertions::assert_eq;
use scout_engine::{
    ExtractorSelectors, FeedPostExtractor, Pacer, PacingSettings, ScrollCollector,
};
use support::{feed_page, init_logging, post_card, FakeBrowser};

fn lead(n: usize) -> String {
    post_card(
        &format!("Neighbor {n}"),
        &format!("Request {n}: looking for a reliable pool cleaner for weekly service"),
        &format!("/p/{n}"),
    )
}

fn page(numbers: &[usize]) -> String {
    let cards: Vec<String> = numbers.iter().map(|&n| lead(n)).collect();
    feed_page(&cards)
}

fn extractor() -> FeedPostExtractor {
    FeedPostExtractor::new(&ExtractorSelectors::default(), "https://nextdoor.com").unwrap()
}

fn pacer() -> Pacer {
    Pacer::new(PacingSettings::instant())
}

#[tokio::test]
async fn stops_on_third_round_without_new_posts() {
    init_logging();
    let browser = FakeBrowser::new("https://nextdoor.com/search/");
    browser.serve_pages(vec![page(&[1, 2]), page(&[1, 2, 3])]);
    let extractor = extractor();
    let pacer = pacer();

    let posts = ScrollCollector::new(&browser, &extractor, &pacer)
        .collect(20)
        .await
        .unwrap();

    assert_eq!(posts.len(), 3);
    assert_eq!(
        posts.iter().map(|p| p.round).collect::<Vec<_>>(),
        vec![1, 1, 2]
    );
    assert_eq!(browser.page_source_calls(), 5);
    assert_eq!(browser.scrolls(), 4);
}

#[tokio::test]
async fn never_exceeds_max_rounds() {
    init_logging();
    let browser = FakeBrowser::new("https://nextdoor.com/search/");
    browser.serve_pages((1..=10).map(|n| page(&[n])).collect());
    let extractor = extractor();
    let pacer = pacer();

    let posts = ScrollCollector::new(&browser, &extractor, &pacer)
        .collect(4)
        .await
        .unwrap();

    assert_eq!(posts.len(), 4);
    assert_eq!(browser.page_source_calls(), 4);
    assert_eq!(browser.scrolls(), 3);
}

#[tokio::test]
async fn unchanged_height_is_confirmed_before_stopping() {
    init_logging();
    let browser = FakeBrowser::new("https://nextdoor.com/search/");
    browser.serve_pages(vec![page(&[1, 2])]);
    browser.set_growing(false);
    let extractor = extractor();
    let pacer = pacer();

    let posts = ScrollCollector::new(&browser, &extractor, &pacer)
        .collect(20)
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(browser.page_source_calls(), 1);
    assert_eq!(browser.scrolls(), 2);
}

#[tokio::test]
async fn scroll_distance_stays_in_configured_range() {
    init_logging();
    let browser = FakeBrowser::new("https://nextdoor.com/search/");
    browser.serve_pages((1..=6).map(|n| page(&[n])).collect());
    let extractor = extractor();
    let pacer = pacer();

    ScrollCollector::new(&browser, &extractor, &pacer)
        .collect(6)
        .await
        .unwrap();

    let distances: Vec<i64> = browser
        .events()
        .iter()
        .filter_map(|e| e.strip_prefix("scroll:"))
        .map(|px| px.parse().unwrap())
        .collect();
    assert_eq!(distances.len(), 5);
    assert!(distances.iter().all(|px| (500..=800).contains(px)));
}

#[tokio::test]
async fn driver_error_in_first_round_fails() {
    init_logging();
    let browser = FakeBrowser::new("https://nextdoor.com/search/");
    browser.serve_pages(vec![page(&[1])]);
    browser.fail_page_source_from(1);
    let extractor = extractor();
    let pacer = pacer();

    let result = ScrollCollector::new(&browser, &extractor, &pacer)
        .collect(20)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn later_driver_error_keeps_collected_posts() {
    init_logging();
    let browser = FakeBrowser::new("https://nextdoor.com/search/");
    browser.serve_pages(vec![page(&[1, 2]), page(&[3])]);
    browser.fail_page_source_from(2);
    let extractor = extractor();
    let pacer = pacer();

    let posts = ScrollCollector::new(&browser, &extractor, &pacer)
        .collect(20)
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);
}
