use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::data_models::SearchOutcome;
use crate::scrapper::Scrapper;

use super::models::SearchRequest;

/// Search Brave and return the outcome.
///
/// The only error response is the 400 for an empty query; pipeline failures
/// come back as a 200 with the status field set.
pub async fn search_handler(
    State(scrapper): State<Arc<Scrapper>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, (StatusCode, String)> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query cannot be empty".to_string()));
    }

    let outcome = scrapper.search(query).await;
    Ok(Json(outcome))
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
