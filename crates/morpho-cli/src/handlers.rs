use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use morpho_grammar::{GrammarError, Validator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::stages::WordReport;

pub const MAX_WORD_LEN: usize = 64;

#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<Validator>,
    pub disable_cache: bool,
}

#[derive(Deserialize)]
pub struct WordQuery {
    pub word: Option<String>,
}

#[derive(Serialize)]
pub struct PeelResponse {
    word: String,
    prefix: Option<String>,
    root: String,
    suffix: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/validate", get(validate))
        .route("/v1/peel", get(peel))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn validate(
    State(state): State<AppState>,
    Query(params): Query<WordQuery>,
) -> Result<Response, ApiError> {
    let word = parse_word(params.word.as_deref())?;
    let verdict = state.validator.is_valid(&word).map_err(|err| match err {
        GrammarError::NotReady { .. } => ApiError::NotReady(err.to_string()),
        other => {
            warn!("validation failed: {other}");
            ApiError::Internal
        }
    })?;
    Ok(cached(&state, Json(WordReport::from(verdict))))
}

async fn peel(
    State(state): State<AppState>,
    Query(params): Query<WordQuery>,
) -> Result<Response, ApiError> {
    let word = parse_word(params.word.as_deref())?;
    let seg = state.validator.peeler().peel(&word);
    let response = PeelResponse {
        prefix: seg.prefix.map(str::to_string),
        root: seg.root.to_string(),
        suffix: seg.suffix.map(str::to_string),
        word,
    };
    Ok(cached(&state, Json(response)))
}

fn cached(state: &AppState, body: impl IntoResponse) -> Response {
    if state.disable_cache {
        return body.into_response();
    }
    (
        [(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=300"),
        )],
        body,
    )
        .into_response()
}

/// Normalise a query word to a lowercase token.
pub fn parse_word(raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(ApiError::bad_request("word is required"));
    }
    if raw.len() > MAX_WORD_LEN {
        return Err(ApiError::bad_request(format!(
            "word must be at most {MAX_WORD_LEN} letters"
        )));
    }
    if let Some(bad) = raw.chars().find(|c| !c.is_ascii_alphabetic()) {
        return Err(ApiError::bad_request(format!(
            "invalid character in word: {bad}"
        )));
    }
    Ok(raw.to_ascii_lowercase())
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotReady(String),
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        ApiError::BadRequest(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::NotReady(msg) => {
                let body = Json(ErrorResponse { error: msg });
                (StatusCode::SERVICE_UNAVAILABLE, body).into_response()
            }
            ApiError::Internal => {
                let body = Json(json!({ "error": "internal server error" }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
