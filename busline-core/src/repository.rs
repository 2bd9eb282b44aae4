use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::Booking;
use crate::route::{Route, RouteDetails};

pub type StoreError = Box<dyn std::error::Error + Send + Sync>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for routes and bookings.
///
/// The two `commit_*` methods are the only writers of seat counts. Each must
/// apply all of its changes as one unit, and only if the route's `version`
/// still equals `expected_version`. They return `Ok(false)` when the guard
/// fails and nothing was written.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn insert_route(&self, route: &Route) -> StoreResult<()>;

    async fn get_route(&self, id: Uuid) -> StoreResult<Option<Route>>;

    async fn list_routes(&self) -> StoreResult<Vec<Route>>;

    /// Overwrites descriptive fields. Returns `None` for an unknown route.
    async fn update_route_details(
        &self,
        id: Uuid,
        details: &RouteDetails,
    ) -> StoreResult<Option<Route>>;

    /// Takes `booking.seats_booked` from the route and inserts `booking`.
    /// Also fails the guard when the route no longer has enough seats.
    async fn commit_booking(&self, booking: &Booking, expected_version: i64) -> StoreResult<bool>;

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    async fn list_bookings_for_user(&self, user_id: &str) -> StoreResult<Vec<Booking>>;

    /// Flips `booking` from booked to cancelled and gives its seats back.
    /// Also fails the guard when the stored booking is no longer booked.
    async fn commit_cancellation(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> StoreResult<bool>;
}
