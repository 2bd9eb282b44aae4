use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::repository::{LedgerStore, StoreResult};
use crate::route::{Route, RouteDetails};

#[derive(Default)]
struct Tables {
    routes: HashMap<Uuid, Route>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-process store. Every commit runs under one write lock, which makes
/// the route update and the booking write a single unit for readers.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_route(&self, route: &Route) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.routes.contains_key(&route.id) {
            return Err(format!("Route {} already exists", route.id).into());
        }
        tables.routes.insert(route.id, route.clone());
        Ok(())
    }

    async fn get_route(&self, id: Uuid) -> StoreResult<Option<Route>> {
        Ok(self.tables.read().await.routes.get(&id).cloned())
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let mut routes: Vec<Route> = self.tables.read().await.routes.values().cloned().collect();
        routes.sort_by_key(|r| (r.departure_time, r.id));
        Ok(routes)
    }

    async fn update_route_details(
        &self,
        id: Uuid,
        details: &RouteDetails,
    ) -> StoreResult<Option<Route>> {
        let mut tables = self.tables.write().await;
        let Some(route) = tables.routes.get_mut(&id) else {
            return Ok(None);
        };
        route.name = details.name.clone();
        route.source = details.source.clone();
        route.destination = details.destination.clone();
        route.departure_time = details.departure_time;
        route.price_amount = details.price_amount;
        route.updated_at = Utc::now();
        Ok(Some(route.clone()))
    }

    async fn commit_booking(&self, booking: &Booking, expected_version: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.bookings.contains_key(&booking.id) {
            return Err(format!("Booking {} already exists", booking.id).into());
        }
        let Some(route) = tables.routes.get_mut(&booking.route_id) else {
            return Err(format!("Route {} vanished", booking.route_id).into());
        };
        if route.version != expected_version || route.available_seats < booking.seats_booked {
            return Ok(false);
        }
        route.available_seats -= booking.seats_booked;
        route.version += 1;
        route.updated_at = Utc::now();
        tables.bookings.insert(booking.id, booking.clone());
        Ok(true)
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(self.tables.read().await.bookings.get(&id).cloned())
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> StoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .tables
            .read()
            .await
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn commit_cancellation(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let Tables { routes, bookings } = &mut *tables;

        let Some(stored) = bookings.get_mut(&booking.id) else {
            return Err(format!("Booking {} vanished", booking.id).into());
        };
        let Some(route) = routes.get_mut(&stored.route_id) else {
            return Err(format!("Route {} vanished", stored.route_id).into());
        };
        if stored.status != BookingStatus::Booked || route.version != expected_version {
            return Ok(false);
        }

        let now = Utc::now();
        stored.status = BookingStatus::Cancelled;
        stored.updated_at = now;
        route.available_seats += stored.seats_booked;
        route.version += 1;
        route.updated_at = now;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::NewRoute;

    async fn seeded(capacity: i32) -> (InMemoryLedgerStore, Route) {
        let store = InMemoryLedgerStore::new();
        let route = NewRoute {
            name: "Coastal".to_string(),
            source: "Mangalore".to_string(),
            destination: "Udupi".to_string(),
            departure_time: Utc::now(),
            price_amount: 25000,
            capacity,
        }
        .into_route();
        store.insert_route(&route).await.unwrap();
        (store, route)
    }

    #[tokio::test]
    async fn test_commit_booking_applies_both_writes() {
        let (store, route) = seeded(4).await;
        let booking = Booking::new(route.id, "user-1", 3);

        assert!(store.commit_booking(&booking, route.version).await.unwrap());

        let after = store.get_route(route.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 1);
        assert_eq!(after.version, route.version + 1);
        assert_eq!(store.get_booking(booking.id).await.unwrap(), Some(booking));
    }

    #[tokio::test]
    async fn test_stale_version_writes_nothing() {
        let (store, route) = seeded(4).await;
        let first = Booking::new(route.id, "user-1", 1);
        assert!(store.commit_booking(&first, route.version).await.unwrap());

        let stale = Booking::new(route.id, "user-2", 1);
        assert!(!store.commit_booking(&stale, route.version).await.unwrap());
        assert!(store.get_booking(stale.id).await.unwrap().is_none());
        assert_eq!(store.get_route(route.id).await.unwrap().unwrap().available_seats, 3);
    }

    #[tokio::test]
    async fn test_cancellation_guarded_by_status() {
        let (store, route) = seeded(4).await;
        let booking = Booking::new(route.id, "user-1", 2);
        assert!(store.commit_booking(&booking, 0).await.unwrap());

        assert!(store.commit_cancellation(&booking, 1).await.unwrap());
        // already cancelled, even with the current version
        assert!(!store.commit_cancellation(&booking, 2).await.unwrap());

        let after = store.get_route(route.id).await.unwrap().unwrap();
        assert_eq!(after.available_seats, 4);
        assert_eq!(after.version, 2);
    }

    #[tokio::test]
    async fn test_user_bookings_filtered() {
        let (store, route) = seeded(10).await;
        let mine = Booking::new(route.id, "alice", 1);
        let theirs = Booking::new(route.id, "bob", 1);
        assert!(store.commit_booking(&mine, 0).await.unwrap());
        assert!(store.commit_booking(&theirs, 1).await.unwrap());

        let listed = store.list_bookings_for_user("alice").await.unwrap();
        assert_eq!(listed, vec![mine]);
    }
}
