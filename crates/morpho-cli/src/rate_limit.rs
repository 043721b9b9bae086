use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tower::{Layer, Service};
use tracing::{debug, warn};

const LOG_INTERVAL: Duration = Duration::from_secs(60);
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_CLIENT_HEADER: &str = "x-forwarded-for";

/// Per-client token bucket shared by every route the layer wraps.
///
/// A client is the last hop of the client header, which is the address the
/// trusted proxy appended, or the peer address from [`ConnectInfo`] when the
/// header is absent. Requests with neither pass through.
#[derive(Clone)]
pub struct RateLimiter<S> {
    inner: S,
    limits: Arc<Limits>,
}

struct Limits {
    buckets: DashMap<String, Bucket>,
    rate_per_sec: f64,
    burst: f64,
    client_header: HeaderName,
    dropped_since_log: AtomicU64,
    last_log: Mutex<Instant>,
    last_prune: Mutex<Instant>,
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Clone)]
pub struct RateLimiterLayer {
    limits: Arc<Limits>,
}

impl RateLimiterLayer {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self::with_client_header(
            rate_per_sec,
            burst,
            HeaderName::from_static(DEFAULT_CLIENT_HEADER),
        )
    }

    pub fn with_client_header(rate_per_sec: u32, burst: u32, client_header: HeaderName) -> Self {
        let now = Instant::now();
        Self {
            limits: Arc::new(Limits {
                buckets: DashMap::new(),
                rate_per_sec: rate_per_sec as f64,
                burst: burst as f64,
                client_header,
                dropped_since_log: AtomicU64::new(0),
                last_log: Mutex::new(now),
                last_prune: Mutex::new(now),
            }),
        }
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            limits: Arc::clone(&self.limits),
        }
    }
}

/// Parse a `--client-header` value.
pub fn parse_client_header(raw: &str) -> Result<HeaderName, String> {
    HeaderName::from_bytes(raw.trim().as_bytes())
        .map_err(|_| format!("invalid header name '{raw}'"))
}

impl<S, ReqBody> Service<Request<ReqBody>> for RateLimiter<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let now = Instant::now();
        self.limits.maybe_prune(now);
        if let Some(client) = self.limits.client_id(&req)
            && !self.limits.check_and_consume(&client, now)
        {
            self.limits.record_drop();
            return Box::pin(async {
                Ok((StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response())
            });
        }

        Box::pin(self.inner.call(req))
    }
}

impl Limits {
    // Earlier hops are whatever the client sent; only the last one was
    // written by our proxy.
    fn client_id<B>(&self, req: &Request<B>) -> Option<String> {
        let forwarded = req
            .headers()
            .get(&self.client_header)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.rsplit(',').next())
            .map(str::trim)
            .filter(|hop| !hop.is_empty());
        if let Some(hop) = forwarded {
            return Some(hop.to_string());
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    }

    fn check_and_consume(&self, client: &str, now: Instant) -> bool {
        let mut entry = self.buckets.entry(client.to_string()).or_insert(Bucket {
            tokens: self.burst,
            last_refill: now,
        });
        let elapsed = now.saturating_duration_since(entry.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            entry.tokens = (entry.tokens + elapsed * self.rate_per_sec).min(self.burst);
            entry.last_refill = now;
        }
        if entry.tokens >= 1.0 {
            entry.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time after which an untouched bucket has refilled completely.
    fn idle_ttl(&self) -> Duration {
        Duration::from_secs_f64(self.burst / self.rate_per_sec.max(f64::MIN_POSITIVE))
            .max(Duration::from_secs(1))
    }

    fn maybe_prune(&self, now: Instant) {
        let Ok(mut last) = self.last_prune.try_lock() else {
            return;
        };
        if now.saturating_duration_since(*last) >= PRUNE_INTERVAL {
            self.prune(now);
            *last = now;
        }
    }

    // A full bucket behaves exactly like a missing one, so dropping it is
    // invisible to the client.
    fn prune(&self, now: Instant) {
        let ttl = self.idle_ttl();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < ttl);
        let removed = before.saturating_sub(self.buckets.len());
        if removed > 0 {
            debug!("rate limiter evicted {removed} idle clients");
        }
    }

    fn record_drop(&self) {
        self.dropped_since_log.fetch_add(1, Ordering::Relaxed);
        let now = Instant::now();
        let Ok(mut last) = self.last_log.lock() else {
            return;
        };
        if now.saturating_duration_since(*last) >= LOG_INTERVAL {
            let dropped = self.dropped_since_log.swap(0, Ordering::Relaxed);
            if dropped > 0 {
                warn!("rate limiter dropped {dropped} requests in the last minute");
            }
            *last = now;
        }
    }
}
