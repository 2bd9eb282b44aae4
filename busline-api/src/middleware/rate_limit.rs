use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use busline_store::redis_repo::rate_limit_key;
use std::net::SocketAddr;

use crate::state::AppState;

/// Per-IP fixed-window limit backed by Redis. The window opens on a client's
/// first request and closes `window_seconds` later regardless of traffic.
/// Fails open when Redis is unreachable or the peer address is unknown.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(redis) = state.redis.as_ref() else {
        return next.run(req).await;
    };
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().cloned() else {
        return next.run(req).await;
    };

    let key = rate_limit_key(&addr.ip().to_string());
    let limits = &state.rate_limit;

    match redis.check_rate_limit(&key, limits.requests, limits.window_seconds).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::warn!("Rate limit exceeded for {}", addr.ip());
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
        }
        Err(e) => {
            tracing::warn!("Rate limiter unavailable, letting request through: {}", e);
            next.run(req).await
        }
    }
}
