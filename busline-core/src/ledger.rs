use std::sync::Arc;
use uuid::Uuid;

use crate::booking::Booking;
use crate::repository::LedgerStore;
use crate::route::{NewRoute, Route, RouteDetails};
use crate::{LedgerError, LedgerResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// Seat inventory for every route, on top of a [`LedgerStore`].
///
/// Seat mutations are optimistic: read the route, decide, then commit
/// against the version that was read. A lost race re-reads and tries again
/// until `max_attempts` is used up.
#[derive(Clone)]
pub struct SeatLedger {
    store: Arc<dyn LedgerStore>,
    max_attempts: u32,
}

impl SeatLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(store: Arc<dyn LedgerStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Reserve `seats_requested` seats on a route for `user_id`.
    pub async fn book(
        &self,
        route_id: Uuid,
        user_id: &str,
        seats_requested: i32,
    ) -> LedgerResult<Booking> {
        if seats_requested <= 0 {
            return Err(LedgerError::InvalidInput(format!(
                "seats_booked must be a positive integer, got {}",
                seats_requested
            )));
        }
        if user_id.trim().is_empty() {
            return Err(LedgerError::InvalidInput("user id is required".to_string()));
        }

        for attempt in 1..=self.max_attempts {
            let route = self.route(route_id).await?;
            if route.available_seats < seats_requested {
                return Err(LedgerError::InsufficientCapacity {
                    requested: seats_requested,
                    available: route.available_seats,
                });
            }

            let booking = Booking::new(route_id, user_id, seats_requested);
            if self.store.commit_booking(&booking, route.version).await? {
                return Ok(booking);
            }
            if attempt < self.max_attempts {
                tokio::task::yield_now().await;
            }
        }

        Err(LedgerError::ConflictRetryExhausted { attempts: self.max_attempts })
    }

    /// Cancel a booking and give its seats back to the route.
    ///
    /// Cancelling an already cancelled booking succeeds without touching
    /// the route. The returned booking is always in the cancelled state.
    pub async fn cancel(&self, booking_id: Uuid) -> LedgerResult<Booking> {
        for attempt in 1..=self.max_attempts {
            let booking = self.booking(booking_id).await?;
            if booking.is_cancelled() {
                return Ok(booking);
            }

            let route = self.route(booking.route_id).await?;
            if self.store.commit_cancellation(&booking, route.version).await? {
                return Ok(booking.into_cancelled());
            }
            if attempt < self.max_attempts {
                tokio::task::yield_now().await;
            }
        }

        Err(LedgerError::ConflictRetryExhausted { attempts: self.max_attempts })
    }

    pub async fn get_availability(&self, route_id: Uuid) -> LedgerResult<i32> {
        Ok(self.route(route_id).await?.available_seats)
    }

    pub async fn register_route(&self, new_route: NewRoute) -> LedgerResult<Route> {
        new_route.validate()?;
        let route = new_route.into_route();
        self.store.insert_route(&route).await?;
        Ok(route)
    }

    pub async fn update_route_details(
        &self,
        route_id: Uuid,
        details: RouteDetails,
    ) -> LedgerResult<Route> {
        details.validate()?;
        self.store
            .update_route_details(route_id, &details)
            .await?
            .ok_or_else(|| LedgerError::route_not_found(route_id))
    }

    pub async fn routes(&self) -> LedgerResult<Vec<Route>> {
        Ok(self.store.list_routes().await?)
    }

    pub async fn route(&self, route_id: Uuid) -> LedgerResult<Route> {
        self.store
            .get_route(route_id)
            .await?
            .ok_or_else(|| LedgerError::route_not_found(route_id))
    }

    pub async fn booking(&self, booking_id: Uuid) -> LedgerResult<Booking> {
        self.store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| LedgerError::booking_not_found(booking_id))
    }

    pub async fn bookings_for_user(&self, user_id: &str) -> LedgerResult<Vec<Booking>> {
        Ok(self.store.list_bookings_for_user(user_id).await?)
    }
}
