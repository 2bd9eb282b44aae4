use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use busline_core::booking::Booking;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::error::{ApiJson, AppError};
use crate::parse_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookSeatsRequest {
    pub seats_booked: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub message: &'static str,
    pub booking: Booking,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings/book/{bus_id}", post(book_bus))
        .route("/api/bookings/cancel/{booking_id}", put(cancel_booking))
        .route("/api/bookings/mine", get(my_bookings))
        .route("/api/bookings/{booking_id}", get(get_booking))
}

async fn book_bus(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(bus_id): Path<String>,
    ApiJson(req): ApiJson<BookSeatsRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let bus_id = parse_id(&bus_id, "Bus")?;
    let seats = req
        .seats_booked
        .ok_or_else(|| AppError::ValidationError("seats_booked is required".to_string()))?;

    let booking = state.ledger.book(bus_id, &claims.sub, seats).await.map_err(|e| {
        warn!("Booking {} seats on {} for {} rejected: {}", seats, bus_id, claims.sub, e);
        AppError::from(e)
    })?;

    info!("Booking {} confirmed: {} seats on bus {}", booking.id, booking.seats_booked, bus_id);
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let booking_id = parse_id(&booking_id, "Booking")?;

    let existing = state.ledger.booking(booking_id).await?;
    if !claims.can_act_for(&existing.user_id) {
        warn!("{} tried to cancel booking {} owned by someone else", claims.sub, booking_id);
        return Err(AppError::AuthorizationError(
            "Booking does not belong to you".to_string(),
        ));
    }

    let booking = state.ledger.cancel(booking_id).await?;
    info!("Booking {} cancelled by {}", booking.id, claims.sub);

    Ok(Json(CancelResponse {
        message: "Booking cancelled",
        booking,
    }))
}

async fn my_bookings(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state.ledger.bookings_for_user(&claims.sub).await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking_id = parse_id(&booking_id, "Booking")?;
    let booking = state.ledger.booking(booking_id).await?;
    if !claims.can_act_for(&booking.user_id) {
        return Err(AppError::AuthorizationError(
            "Booking does not belong to you".to_string(),
        ));
    }
    Ok(Json(booking))
}
