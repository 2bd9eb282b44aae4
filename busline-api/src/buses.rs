use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use busline_core::route::{NewRoute, Route, RouteDetails};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::{ApiJson, AppError};
use crate::parse_id;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BusResponse {
    pub id: Uuid,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub price_amount: i32,
    pub seats: i32,
    pub available_seats: i32,
    pub booked_seats: i32,
}

impl From<Route> for BusResponse {
    fn from(route: Route) -> Self {
        let booked_seats = route.booked_seats();
        Self {
            id: route.id,
            name: route.name,
            source: route.source,
            destination: route.destination,
            departure_time: route.departure_time,
            price_amount: route.price_amount,
            seats: route.capacity,
            available_seats: route.available_seats,
            booked_seats,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub bus_id: Uuid,
    pub available_seats: i32,
}

#[derive(Debug, Serialize)]
pub struct BusCreatedResponse {
    pub message: &'static str,
    pub bus: BusResponse,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/buses", get(list_buses))
        .route("/api/buses/add", post(add_bus))
        .route("/api/buses/{bus_id}", get(get_bus).put(update_bus))
        .route("/api/buses/{bus_id}/availability", get(get_availability))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/buses
async fn list_buses(State(state): State<AppState>) -> Result<Json<Vec<BusResponse>>, AppError> {
    let routes = state.ledger.routes().await?;
    Ok(Json(routes.into_iter().map(BusResponse::from).collect()))
}

/// GET /api/buses/{bus_id}
async fn get_bus(
    State(state): State<AppState>,
    Path(bus_id): Path<String>,
) -> Result<Json<BusResponse>, AppError> {
    let bus_id = parse_id(&bus_id, "Bus")?;
    let route = state.ledger.route(bus_id).await?;
    Ok(Json(route.into()))
}

/// GET /api/buses/{bus_id}/availability
async fn get_availability(
    State(state): State<AppState>,
    Path(bus_id): Path<String>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let bus_id = parse_id(&bus_id, "Bus")?;
    let available_seats = state.ledger.get_availability(bus_id).await?;
    Ok(Json(AvailabilityResponse { bus_id, available_seats }))
}

/// POST /api/buses/add
async fn add_bus(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<NewRoute>,
) -> Result<(StatusCode, Json<BusCreatedResponse>), AppError> {
    let route = state.ledger.register_route(req).await?;
    info!("Bus {} added by {} with {} seats", route.id, admin.sub, route.capacity);

    Ok((
        StatusCode::CREATED,
        Json(BusCreatedResponse {
            message: "Bus added successfully",
            bus: route.into(),
        }),
    ))
}

/// PUT /api/buses/{bus_id}
async fn update_bus(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(bus_id): Path<String>,
    ApiJson(req): ApiJson<RouteDetails>,
) -> Result<Json<BusResponse>, AppError> {
    let bus_id = parse_id(&bus_id, "Bus")?;
    let route = state.ledger.update_route_details(bus_id, req).await?;
    info!("Bus {} updated by {}", route.id, admin.sub);
    Ok(Json(route.into()))
}
