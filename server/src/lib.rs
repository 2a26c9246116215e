use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use mdsearch_core::config::{clamp_limit, LoaderConfig, CONTENT_FIELD, DEFAULT_LIMIT, FILENAME_FIELD};
use mdsearch_core::preview::preview;
use mdsearch_core::{build_from_directory, Document, Error, ScoredResult, SharedIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

/// Preview length for API results.
pub const API_PREVIEW_CHARS: usize = 150;

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_LIMIT }

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
    pub k: Option<usize>,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
    #[serde(default)]
    pub boosts: BTreeMap<String, f64>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    /// Matches before truncation to `k`.
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub filename: String,
    pub score: f64,
    pub preview: String,
}

impl From<ScoredResult> for SearchHit {
    fn from(r: ScoredResult) -> Self {
        Self {
            doc_id: r.doc_id,
            filename: r.document.field(FILENAME_FIELD).to_string(),
            score: r.score,
            preview: preview(r.document.field(CONTENT_FIELD), API_PREVIEW_CHARS),
        }
    }
}

#[derive(Serialize)]
pub struct RebuildResponse {
    pub documents: u32,
    pub skipped: usize,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

#[derive(Clone)]
pub struct AppState {
    pub index: SharedIndex,
    pub loader: LoaderConfig,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Load and index the corpus once; the result is published for all handlers.
    pub fn load(loader: LoaderConfig, admin_token: Option<String>) -> Result<Self> {
        let (index, skipped) = build_from_directory(&loader)?;
        tracing::info!(documents = index.num_docs(), skipped, "initial index ready");
        Ok(Self { index: SharedIndex::new(index), loader, admin_token })
    }
}

pub fn build_app(loader: LoaderConfig) -> Result<Router> {
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState::load(loader, admin_token)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Ok(router(state).layer(cors))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_get).post(search_post))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/index/rebuild", post(index_rebuild))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_get(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let query = mdsearch_core::Query::new(params.q).limit(clamp_limit(params.k));
    run_search(&state, query)
}

pub async fn search_post(State(state): State<AppState>, Json(req): Json<SearchRequest>) -> Result<Json<SearchResponse>, ApiError> {
    let mut query = mdsearch_core::Query::new(req.query).limit(clamp_limit(req.k.unwrap_or(DEFAULT_LIMIT)));
    query.filters = req.filters;
    query.boosts = req.boosts;
    run_search(&state, query)
}

fn run_search(state: &AppState, query: mdsearch_core::Query) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    // snapshot: a concurrent rebuild cannot change the index under this query
    let index = state.index.snapshot();
    let (hits, total_hits) = index.search_with_total(&query).map_err(api_error)?;
    let results: Vec<SearchHit> = hits.into_iter().map(SearchHit::from).collect();
    let elapsed = start.elapsed();
    tracing::debug!(query = %query.text, total_hits, took_s = elapsed.as_secs_f64(), "search");
    Ok(Json(SearchResponse { query: query.text, took_s: elapsed.as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<u32>) -> Result<Json<Document>, ApiError> {
    let index = state.index.snapshot();
    let doc = index.get(doc_id).map_err(api_error)?;
    Ok(Json(doc.clone()))
}

/// Reload the corpus root and publish a fresh index. Requests already running
/// finish against the index they started with. When rebuilds overlap, only
/// the one that started last is published; the others answer 409.
async fn index_rebuild(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<RebuildResponse>, ApiError> {
    authorize(&state, &headers)?;
    let ticket = state.index.ticket();
    let loader = state.loader.clone();
    let (index, skipped) = tokio::task::spawn_blocking(move || build_from_directory(&loader))
        .await
        .map_err(|e| error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(api_error)?;
    let documents = index.num_docs();
    if state.index.publish_as(ticket, index).is_none() {
        return Err(error_body(StatusCode::CONFLICT, "superseded by a newer rebuild".into()));
    }
    tracing::info!(documents, skipped, ticket, "index rebuilt");
    Ok(Json(RebuildResponse { documents, skipped }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err(error_body(StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err(error_body(StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::UnknownField(_) | Error::InvalidBoost { .. } | Error::InvalidDocument { .. } => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::EmptyCorpus | Error::CorpusRoot(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Io(_) | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_body(status, err.to_string())
}

fn error_body(status: StatusCode, message: String) -> ApiError {
    (status, Json(serde_json::json!({ "error": message })))
}
