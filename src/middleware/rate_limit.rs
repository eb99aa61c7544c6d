use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::middleware::auth::bearer_token;
use crate::utils::token::decode_token;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Throttled { retry_after_secs: u64 },
}

/// Sliding-window admission control keyed by identity.
///
/// Every bucket lives behind one mutex: prune, count and append for a key
/// happen inside a single critical section, so two concurrent checks can
/// never both take the last free slot. No await happens while the lock is
/// held, which keeps cancelled requests from leaving a bucket half-updated.
#[derive(Clone, Debug)]
pub struct SlidingWindowLimiter {
    window: Duration,
    max_calls: usize,
    guarded_prefixes: Arc<[String]>,
    buckets: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max_calls: usize, guarded_prefixes: Vec<String>) -> Self {
        Self {
            window: window.max(Duration::from_secs(1)),
            max_calls: max_calls.max(1),
            guarded_prefixes: guarded_prefixes.into(),
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn guards(&self, path: &str) -> bool {
        self.guarded_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    pub fn check(&self, key: &str) -> Admission {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> Admission {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(key.to_string()).or_default();

        while let Some(oldest) = bucket.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                bucket.pop_front();
            } else {
                break;
            }
        }

        if bucket.len() >= self.max_calls {
            // Whole seconds, rounded up.
            let retry_after_secs = bucket
                .front()
                .map(|oldest| {
                    let left = (*oldest + self.window).saturating_duration_since(now);
                    left.as_secs() + u64::from(left.subsec_nanos() > 0)
                })
                .unwrap_or(0)
                .max(1);
            return Admission::Throttled { retry_after_secs };
        }

        bucket.push_back(now);
        Admission::Admitted
    }

    /// Drops buckets whose timestamps have all aged out. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let before = buckets.len();
        let window = self.window;
        buckets.retain(|_, bucket| {
            bucket
                .back()
                .is_some_and(|newest| now.saturating_duration_since(*newest) < window)
        });
        before - buckets.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// `user:<sub>` for a verified bearer token, otherwise `ip:<addr>`.
/// A bad token is not an error here: anonymous traffic still gets limited.
pub fn rate_limit_key(headers: &HeaderMap, peer: Option<IpAddr>, secret: &str) -> String {
    if let Some(token) = bearer_token(headers) {
        match decode_token(token, secret) {
            Ok(claims) if !claims.sub.is_empty() => return format!("user:{}", claims.sub),
            Ok(_) => {}
            Err(_) => tracing::debug!("rate limit: unverifiable bearer token, keying by address"),
        }
    }
    match peer {
        Some(ip) => format!("ip:{}", ip),
        None => "ip:unknown".to_string(),
    }
}

fn too_many_requests(key: &str, limiter: &SlidingWindowLimiter, retry_after_secs: u64) -> Response {
    let body = json!({
        "detail": "Too Many Requests",
        "key": key,
        "window_seconds": limiter.window().as_secs(),
        "max_calls": limiter.max_calls(),
        "try_again_in": retry_after_secs,
    });
    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    response
}

pub async fn rate_limit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let limiter = &state.rate_limiter;
    if !limiter.guards(req.uri().path()) {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let key = rate_limit_key(req.headers(), peer, &state.config.secret_key);

    match limiter.check(&key) {
        Admission::Admitted => next.run(req).await,
        Admission::Throttled { retry_after_secs } => {
            tracing::warn!(key = %key, retry_after_secs, "rate limit exceeded");
            too_many_requests(&key, limiter, retry_after_secs)
        }
    }
}
