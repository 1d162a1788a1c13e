use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

#[derive(Debug)]
struct Window {
    opened: Instant,
    used: u32,
}

/// Fixed one-second window shared by every request routed through it.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    per_second: u32,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn new(per_second: u32) -> Self {
        Self {
            per_second: per_second.max(1),
            window: Arc::new(Mutex::new(Window {
                opened: Instant::now(),
                used: 0,
            })),
        }
    }

    fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        // Counter state stays valid even if a holder panicked.
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(window.opened) >= Duration::from_secs(1) {
            window.opened = now;
            window.used = 0;
        }
        if window.used < self.per_second {
            window.used += 1;
            true
        } else {
            false
        }
    }
}

pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.try_acquire() {
        tracing::warn!(path = %req.uri().path(), "request rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "detail": "Request was throttled." })),
        )
            .into_response();
    }
    next.run(req).await
}
