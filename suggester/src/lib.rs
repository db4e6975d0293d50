use anyhow::{Context, Result};
use axum::{extract::{Query, State}, http::{HeaderValue, StatusCode}, routing::get, Json, Router};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use suggest_core::query::suggestions_from_response;
use suggest_core::scoring::RankingPolicy;
use suggest_core::SuggestionQuery;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Issues ranked suggestion queries against the suggestion index.
#[derive(Clone)]
pub struct SuggestClient {
    http: Client,
    search_url: String,
    policy: RankingPolicy,
}

impl SuggestClient {
    pub fn new(es_url: &str, index: &str) -> Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        let search_url = format!("{}/{}/_search", es_url.trim_end_matches('/'), index);
        Ok(Self { http, search_url, policy: RankingPolicy::default() })
    }

    pub async fn suggest(&self, query: &SuggestionQuery) -> Result<Vec<String>> {
        let body = query.to_json(&self.policy);
        let resp = self
            .http
            .post(&self.search_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {}", self.search_url))?
            .error_for_status()
            .with_context(|| format!("POST {}", self.search_url))?;
        let json: serde_json::Value = resp.json().await.context("decoding search response")?;
        suggestions_from_response(&json)
    }
}

#[derive(Deserialize)]
pub struct SuggestParams {
    pub q: String,
    #[serde(default)]
    pub min_views: i64,
    #[serde(default)]
    pub min_answers: i64,
}

#[derive(Serialize)]
pub struct SuggestResponse {
    pub query: String,
    pub took_s: f64,
    pub suggestions: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub client: SuggestClient,
}

/// Cross-origin policy for browser clients. `allowed` is a comma-separated
/// origin list; absent or unparseable lists open the endpoint to any origin.
pub fn cors_layer(allowed: Option<&str>) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .into_iter()
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let allow = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    CorsLayer::new().allow_origin(allow).allow_methods(Any).allow_headers(Any)
}

pub fn build_app(client: SuggestClient) -> Router {
    let cors = cors_layer(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref());

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/suggest", get(suggest_handler))
        .with_state(AppState { client })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn suggest_handler(
    State(state): State<AppState>,
    Query(params): Query<SuggestParams>,
) -> Result<Json<SuggestResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();
    let query = SuggestionQuery::new(&params.q, params.min_views, params.min_answers);
    let suggestions = state.client.suggest(&query).await.map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), q = %params.q, "suggestion query failed");
        (StatusCode::BAD_GATEWAY, "suggestion backend unavailable".to_string())
    })?;
    Ok(Json(SuggestResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), suggestions }))
}
