use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use tower::util::ServiceExt;

use morpho_cli::handlers::{AppState, router};
use morpho_cli::rate_limit::RateLimiterLayer;
use morpho_grammar::{Grammar, Lexicons, Peeler, Validator};
use morpho_lexicon::GrammarDir;
use morpho_types::{MorphemeSet, RuleSet};

fn make_state() -> AppState {
    let lexicons = Lexicons {
        prefixes: MorphemeSet::from_entries([("qo", 31), ("ch", 24)]),
        roots: MorphemeSet::from_entries([("ched", 40), ("ke", 18)]),
        suffixes: MorphemeSet::from_entries([("dy", 52), ("y", 19)]),
    };
    let prefix_root = RuleSet::from_entries([(("qo", "ke"), 9)]);
    let root_suffix = RuleSet::from_entries([(("ke", "dy"), 12), (("ched", "y"), 11)]);
    let grammar = Grammar::new(lexicons, prefix_root, root_suffix).unwrap();
    AppState {
        validator: Arc::new(Validator::new(Peeler::default(), grammar)),
        disable_cache: false,
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&body_bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn healthz_ok() {
    let app = router(make_state());
    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn validate_accepts_grammatical_word() {
    let app = router(make_state());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/validate?word=QoKeDy")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "public, max-age=300"
    );
    let body_bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["word"], "qokedy");
    assert_eq!(body["accepted"], true);
    assert_eq!(body["reason"], "full_grammatical_match");
    assert_eq!(body["prefix"], "qo");
    assert_eq!(body["root"], "ke");
    assert_eq!(body["suffix"], "dy");
}

#[tokio::test]
async fn validate_reports_rejection_reason() {
    let (status, body) = get(router(make_state()), "/v1/validate?word=chedy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], false);
    assert_eq!(body["reason"], "unknown_root");
    assert_eq!(body["message"], "root 'e' not found in lexicon");
}

#[tokio::test]
async fn bad_words_are_rejected() {
    let (status, body) = get(router(make_state()), "/v1/validate?word=qo-ked").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("invalid"));

    let (status, body) = get(router(make_state()), "/v1/validate").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn not_ready_validator_returns_503() {
    let tmp = tempfile::tempdir().unwrap();
    let validator = Validator::load(Peeler::default(), &GrammarDir::new(tmp.path()));
    let state = AppState {
        validator: Arc::new(validator),
        disable_cache: true,
    };
    let (status, body) = get(router(state.clone()), "/v1/validate?word=chedy").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("prefixes.txt"));

    // peeling needs no grammar
    let (status, body) = get(router(state), "/v1/peel?word=chedy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["root"], "e");
}

#[tokio::test]
async fn peel_endpoint_splits_word() {
    let (status, body) = get(router(make_state()), "/v1/peel?word=qokedy").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["word"], "qokedy");
    assert_eq!(body["prefix"], "qo");
    assert_eq!(body["root"], "ke");
    assert_eq!(body["suffix"], "dy");

    let (_, body) = get(router(make_state()), "/v1/peel?word=dy").await;
    assert_eq!(body["root"], "dy");
    assert!(body["suffix"].is_null());
}

#[tokio::test]
async fn rate_limiter_rejects_past_burst() {
    let app = router(make_state()).layer(RateLimiterLayer::new(1, 1));
    let request = || {
        Request::builder()
            .uri("/healthz")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    };
    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    // no client header and no peer address, no limit
    let anonymous = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::OK);
}

#[tokio::test]
async fn spoofed_leading_hops_share_the_proxy_bucket() {
    let app = router(make_state()).layer(RateLimiterLayer::new(1, 1));
    let mut statuses = Vec::new();
    for i in 0..4 {
        let request = Request::builder()
            .uri("/healthz")
            .header("x-forwarded-for", format!("10.0.0.{i}, 198.51.100.9"))
            .body(Body::empty())
            .unwrap();
        statuses.push(app.clone().oneshot(request).await.unwrap().status());
    }
    assert_eq!(statuses[0], StatusCode::OK);
    assert!(statuses[1..].iter().all(|s| *s == StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn budget_is_shared_across_routes() {
    let app = router(make_state()).layer(RateLimiterLayer::new(1, 1));
    let request = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header("x-forwarded-for", "203.0.113.8")
            .body(Body::empty())
            .unwrap()
    };
    let health = app.clone().oneshot(request("/healthz")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let peel = app.oneshot(request("/v1/peel?word=qokedy")).await.unwrap();
    assert_eq!(peel.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn peer_address_keys_requests_without_header() {
    let app = router(make_state()).layer(RateLimiterLayer::new(1, 1));
    let peer: SocketAddr = "192.0.2.10:40000".parse().unwrap();
    let request = || {
        Request::builder()
            .uri("/healthz")
            .extension(ConnectInfo(peer))
            .body(Body::empty())
            .unwrap()
    };
    let first = app.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let second = app.oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}
