use std::time::Duration;

use anyhow::Result;
use rand::seq::SliceRandom;
use reqwest::StatusCode;
use scraper::{Html, Selector};

use crate::config::CONFIG;
use crate::data_models::{SearchOutcome, SearchResult};
use crate::errors::ScrapeError;

/// Realistic browser User-Agents, rotated per request. Brave serves a
/// challenge page to clients with a bare or missing User-Agent.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Body fragments that identify a challenge page served with a 200.
const BLOCK_MARKERS: &[&str] = &[
    "id=\"challenge-form\"",
    "cf-browser-verification",
    "Attention Required! | Cloudflare",
    "Please verify you are human",
];

pub struct Scrapper {
    client: reqwest::Client,
    base_url: String,
}

impl Scrapper {
    pub fn new() -> Result<Scrapper> {
        Scrapper::with_base_url(CONFIG.search_base_url.clone())
    }

    /// Point the scrapper at a different host. Tests use this to target a
    /// local stand-in for Brave.
    pub fn with_base_url(base_url: String) -> Result<Scrapper> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CONFIG.request_timeout_secs))
            .build()?;
        Ok(Scrapper { client, base_url })
    }

    /// Fetch the raw results page for a query.
    ///
    /// Issues exactly one request. 429/403 and challenge-page bodies are
    /// classified as `Blocked`; every other failure is `Request`.
    pub async fn fetch(&self, query: &str) -> Result<String, ScrapeError> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", query), ("source", "web")])
            .header(reqwest::header::USER_AGENT, user_agent)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScrapeError::Request(format!("request timed out: {e}"))
                } else {
                    ScrapeError::Request(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        tracing::debug!("got {status} for query: {query}");

        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(ScrapeError::Blocked(format!("got HTTP {status}")));
        }
        if !status.is_success() {
            return Err(ScrapeError::Request(format!("unexpected status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::Request(format!("failed to read response body: {e}")))?;

        if let Some(marker) = BLOCK_MARKERS.iter().find(|m| body.contains(*m)) {
            return Err(ScrapeError::Blocked(format!(
                "challenge page detected ({marker})"
            )));
        }

        Ok(body)
    }

    /// Fetch and parse in one call. Never fails: every error from either
    /// step is folded into the outcome's status.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        tracing::info!("searching for: {query}");
        let html = match self.fetch(query).await {
            Ok(html) => html,
            Err(e) => return SearchOutcome::failure(query, &e),
        };
        match parse(&html) {
            Ok(results) => SearchOutcome::success(query, results),
            Err(e) => SearchOutcome::failure(query, &e),
        }
    }
}

/// Extract organic results from a Brave results page.
///
/// Free-standing so fixture HTML can be parsed in tests without any network
/// setup. A block missing its title or link is skipped; zero extracted
/// results is only an error when the page carries no empty-results marker.
pub fn parse(html: &str) -> Result<Vec<SearchResult>, ScrapeError> {
    let document = Html::parse_document(html);

    let result_sel = selector(r#"#results div.snippet[data-type="web"]"#)?;
    let title_sel = selector(".title")?;
    let snippet_sel = selector(".snippet-description")?;
    let link_sel = selector("a[href]")?;

    let mut results: Vec<SearchResult> = Vec::new();
    for element in document.select(&result_sel) {
        let title = element
            .select(&title_sel)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty());
        let Some(title) = title else { continue };

        let url = element
            .select(&link_sel)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.starts_with("http://") || href.starts_with("https://"))
            .map(str::to_string);
        let Some(url) = url else { continue };

        let snippet = element
            .select(&snippet_sel)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            url,
            snippet,
            rank: results.len() as u32 + 1,
        });
    }

    if results.is_empty() && !is_no_results_page(&document) {
        return Err(ScrapeError::Parse(
            "no result blocks and no empty-results marker in page".to_string(),
        ));
    }

    tracing::debug!("parsed {} results", results.len());
    Ok(results)
}

fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|e| ScrapeError::Parse(format!("invalid selector {css}: {e:?}")))
}

/// Brave renders an explicit empty-state block inside #results when a query
/// matches nothing.
fn is_no_results_page(document: &Html) -> bool {
    if let Ok(sel) = Selector::parse("#results .no-results") {
        if document.select(&sel).next().is_some() {
            return true;
        }
    }
    document
        .root_element()
        .text()
        .any(|t| t.contains("No results found"))
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
