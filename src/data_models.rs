use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ScrapeError;

/// One organic result extracted from a results page.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
    /// 1-based position in document order.
    pub rank: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Success,
    Blocked,
    RequestError,
    ParseError,
    Error,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Success => "success",
            SearchStatus::Blocked => "blocked",
            SearchStatus::RequestError => "request_error",
            SearchStatus::ParseError => "parse_error",
            SearchStatus::Error => "error",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one full pipeline invocation.
///
/// `error_message` is present exactly when `status` is not `Success`, and
/// `results` is non-empty only on success. The constructors below are the
/// only way these fields are put together.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SearchResult>,
    pub status: SearchStatus,
    pub error_message: Option<String>,
}

impl SearchOutcome {
    pub fn success(query: &str, results: Vec<SearchResult>) -> SearchOutcome {
        SearchOutcome {
            query: query.to_string(),
            results,
            status: SearchStatus::Success,
            error_message: None,
        }
    }

    pub fn failure(query: &str, error: &ScrapeError) -> SearchOutcome {
        let status = match error {
            ScrapeError::Blocked(_) => SearchStatus::Blocked,
            ScrapeError::Request(_) => SearchStatus::RequestError,
            ScrapeError::Parse(_) => SearchStatus::ParseError,
        };
        SearchOutcome {
            query: query.to_string(),
            results: Vec::new(),
            status,
            error_message: Some(error.to_string()),
        }
    }
}
