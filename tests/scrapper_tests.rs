use std::net::SocketAddr;

use axum::{Router, http::StatusCode, response::Html, routing::get};

use forage::data_models::SearchStatus;
use forage::errors::ScrapeError;
use forage::scrapper::{Scrapper, parse};

mod fixtures {
    /// A Brave results page with three extractable organic results, one ad,
    /// and two malformed blocks that must be skipped.
    pub const BRAVE_SERP: &str = r#"<!DOCTYPE html>
<html>
<head><title>rust - Brave Search</title></head>
<body>
<main id="main">
<div id="results">
  <div class="snippet" data-type="web" data-pos="1">
    <a href="https://www.rust-lang.org/">
      <div class="title">  Rust
          Programming   <strong>Language</strong> </div>
      <div class="site-url">rust-lang.org</div>
    </a>
    <div class="snippet-description">A language empowering everyone
        to build reliable and efficient software.</div>
  </div>
  <div class="snippet" data-type="ad">
    <a href="https://ads.example.com/landing">
      <div class="title">Sponsored: Learn Rust Fast</div>
    </a>
    <div class="snippet-description">Buy our course.</div>
  </div>
  <div class="snippet" data-type="web" data-pos="2">
    <a href="https://doc.rust-lang.org/book/">
      <div class="title">The Rust Programming Language - The Book</div>
    </a>
    <div class="snippet-description">An introductory book about Rust.</div>
  </div>
  <div class="snippet" data-type="web">
    <div class="title">Block without any link</div>
  </div>
  <div class="snippet" data-type="web">
    <a href="/settings">
      <div class="title">Block with a relative link only</div>
    </a>
  </div>
  <div class="snippet" data-type="web" data-pos="3">
    <a href="https://en.wikipedia.org/wiki/Rust_(programming_language)">
      <div class="title">Rust (programming language) - Wikipedia</div>
    </a>
  </div>
</div>
</main>
</body>
</html>"#;

    /// Brave's empty-state page for a query that matches nothing.
    pub const NO_RESULTS_SERP: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="results">
  <div class="no-results">
    <p>No results found for <b>xyzzy plugh</b>. Try different keywords.</p>
  </div>
</div>
</body>
</html>"#;

    /// Empty-state variant without the dedicated block, text marker only.
    pub const NO_RESULTS_TEXT_ONLY: &str = r#"<html>
<body><div id="container"><p>No results found.</p></div></body>
</html>"#;

    pub const UNRELATED_PAGE: &str = r#"<html>
<body><h1>Welcome to my homepage</h1><p>Nothing to see here.</p></body>
</html>"#;

    /// A Cloudflare-style interstitial served with a 200.
    pub const CHALLENGE_PAGE: &str = r#"<html>
<body>
<h1>Attention Required! | Cloudflare</h1>
<form id="challenge-form" action="/verify" method="POST"></form>
</body>
</html>"#;
}

mod test_helpers {
    use super::*;

    pub async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    /// An address nothing is listening on.
    pub async fn closed_port() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    pub fn scrapper_for(addr: SocketAddr) -> Scrapper {
        Scrapper::with_base_url(format!("http://{addr}")).unwrap()
    }
}

// Extractor tests (fixture HTML, no network)

#[test]
fn parse_extracts_organic_results_in_document_order() {
    let results = parse(fixtures::BRAVE_SERP).unwrap();
    assert_eq!(results.len(), 3);

    assert_eq!(results[0].url, "https://www.rust-lang.org/");
    assert_eq!(results[1].url, "https://doc.rust-lang.org/book/");
    assert!(results[2].url.contains("wikipedia.org"));

    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.rank, i as u32 + 1);
        assert!(!result.title.is_empty());
    }
}

#[test]
fn parse_normalizes_title_and_snippet_whitespace() {
    let results = parse(fixtures::BRAVE_SERP).unwrap();
    assert_eq!(results[0].title, "Rust Programming Language");
    assert_eq!(
        results[0].snippet,
        "A language empowering everyone to build reliable and efficient software."
    );
}

#[test]
fn parse_tolerates_missing_snippet() {
    let results = parse(fixtures::BRAVE_SERP).unwrap();
    assert_eq!(results[2].snippet, "");
}

#[test]
fn parse_skips_ads_and_malformed_blocks() {
    let results = parse(fixtures::BRAVE_SERP).unwrap();
    for result in &results {
        assert!(!result.url.contains("ads.example.com"));
        assert!(result.url.starts_with("https://"));
        assert!(!result.title.contains("Block with"));
        assert!(!result.title.contains("Block without"));
    }
}

#[test]
fn parse_empty_results_page_is_success() {
    let results = parse(fixtures::NO_RESULTS_SERP).unwrap();
    assert!(results.is_empty());
}

#[test]
fn parse_recognizes_text_only_empty_marker() {
    let results = parse(fixtures::NO_RESULTS_TEXT_ONLY).unwrap();
    assert!(results.is_empty());
}

#[test]
fn parse_unrelated_page_is_parse_error() {
    let err = parse(fixtures::UNRELATED_PAGE).unwrap_err();
    assert!(matches!(err, ScrapeError::Parse(_)));
}

#[test]
fn parse_empty_input_is_parse_error() {
    let err = parse("").unwrap_err();
    assert!(matches!(err, ScrapeError::Parse(_)));
}

// Fetcher + pipeline tests (local stand-in server)

#[tokio::test]
async fn search_succeeds_against_well_formed_page() {
    let app = Router::new().route("/search", get(|| async { Html(fixtures::BRAVE_SERP) }));
    let addr = test_helpers::serve(app).await;

    let outcome = test_helpers::scrapper_for(addr).search("rust language").await;
    assert_eq!(outcome.status, SearchStatus::Success);
    assert_eq!(outcome.query, "rust language");
    assert!(outcome.error_message.is_none());
    assert_eq!(outcome.results.len(), 3);
}

#[tokio::test]
async fn fetch_classifies_429_as_blocked() {
    let app = Router::new().route(
        "/search",
        get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let addr = test_helpers::serve(app).await;

    let err = test_helpers::scrapper_for(addr).fetch("rust").await.unwrap_err();
    assert!(matches!(err, ScrapeError::Blocked(_)));
}

#[tokio::test]
async fn fetch_classifies_403_as_blocked() {
    let app = Router::new().route("/search", get(|| async { (StatusCode::FORBIDDEN, "no") }));
    let addr = test_helpers::serve(app).await;

    let outcome = test_helpers::scrapper_for(addr).search("rust").await;
    assert_eq!(outcome.status, SearchStatus::Blocked);
    assert!(outcome.error_message.is_some());
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn fetch_classifies_challenge_body_as_blocked() {
    let app = Router::new().route("/search", get(|| async { Html(fixtures::CHALLENGE_PAGE) }));
    let addr = test_helpers::serve(app).await;

    let err = test_helpers::scrapper_for(addr).fetch("rust").await.unwrap_err();
    assert!(matches!(err, ScrapeError::Blocked(_)));
}

#[tokio::test]
async fn fetch_classifies_server_error_as_request_error() {
    let app = Router::new().route(
        "/search",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = test_helpers::serve(app).await;

    let outcome = test_helpers::scrapper_for(addr).search("rust").await;
    assert_eq!(outcome.status, SearchStatus::RequestError);
    assert!(outcome.error_message.is_some());
}

#[tokio::test]
async fn unreachable_host_is_request_error() {
    let addr = test_helpers::closed_port().await;

    let outcome = test_helpers::scrapper_for(addr).search("rust").await;
    assert_eq!(outcome.status, SearchStatus::RequestError);
    assert!(outcome.error_message.is_some());
}

#[tokio::test]
async fn search_never_fails_and_upholds_the_status_invariant() {
    let app = Router::new().route("/search", get(|| async { Html(fixtures::UNRELATED_PAGE) }));
    let addr = test_helpers::serve(app).await;
    let scrapper = test_helpers::scrapper_for(addr);

    for query in ["rust", "", "a very long query with spaces & symbols %20"] {
        let outcome = scrapper.search(query).await;
        assert_eq!(outcome.query, query);
        assert_eq!(
            outcome.status == SearchStatus::Success,
            outcome.error_message.is_none()
        );
    }
}
