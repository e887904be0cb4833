use thiserror::Error;

/// Failures the scrape pipeline can classify.
///
/// `Scrapper::search` catches every variant and folds it into a
/// `SearchOutcome`, so these never escape past the pipeline boundary.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Failed to make the HTTP request.
    #[error("request failed: {0}")]
    Request(String),

    /// Request was blocked (CAPTCHA, rate limit, etc.).
    #[error("blocked by search engine: {0}")]
    Blocked(String),

    /// The response body did not look like a results page.
    #[error("failed to parse results page: {0}")]
    Parse(String),
}
