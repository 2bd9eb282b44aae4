use axum::{
    http::Method,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod auth;
pub mod bookings;
pub mod buses;
pub mod error;
pub mod middleware;
pub mod state;

pub use error::AppError;
pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/health", get(health))
        .merge(buses::routes())
        .merge(bookings::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Ids that do not parse cannot exist, so they are reported as not found.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::NotFoundError(format!("{} not found: {}", entity, raw)))
}
