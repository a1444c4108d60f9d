//! Rate limiting middleware.
//!
//! Limits each authenticated user independently with a `governor` quota.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::num::NonZeroU32;
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::user_auth::AuthUser;

type UserRateLimiter = GovRateLimiter<Uuid, DefaultKeyedStateStore<Uuid>, DefaultClock>;

/// One keyed limiter holding a cell per user.
pub struct RateLimiterState {
    limiter: UserRateLimiter,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    /// `None` when the limit is 0 (disabled).
    pub fn new(rate_limit_per_minute: u32) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self::with_quota(Quota::per_minute(per_minute), rate_limit_per_minute))
    }

    fn with_quota(quota: Quota, rate_limit_per_minute: u32) -> Self {
        Self {
            limiter: GovRateLimiter::keyed(quota),
            rate_limit_per_minute,
        }
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// `Err(retry_after_secs)` when the user is over the limit.
    pub fn check(&self, user_id: Uuid) -> Result<(), u64> {
        self.limiter.check_key(&user_id).map_err(|not_until| {
            let wait_time = not_until.wait_time_from(DefaultClock::default().now());
            wait_time.as_secs().max(1)
        })
    }

    /// Drops users whose quota has fully replenished. Returns how many are
    /// still tracked.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    pub fn tracked_users(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_users", &self.tracked_users())
            .finish()
    }
}

/// Middleware that applies the per-user limit.
///
/// Must run after an auth layer has placed `AuthUser` in the extensions;
/// anonymous requests pass through and are rejected by the handler.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(user_id) = req.extensions().get::<AuthUser>().map(|a| a.identity.user_id) else {
        return next.run(req).await;
    };

    if let Some(ref rate_limiter) = state.rate_limiter {
        if let Err(retry_after) = rate_limiter.check(user_id) {
            tracing::warn!(user_id = %user_id, retry_after, "Rate limit exceeded");
            return rate_limited_response(rate_limiter.rate_limit_per_minute(), retry_after);
        }
    }

    next.run(req).await
}

/// 429 with a `Retry-After` header. The body carries a plain `error` message
/// so it fits the function envelope.
fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}
