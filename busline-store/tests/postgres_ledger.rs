//! Seat ledger scenarios replayed against a real Postgres database.
//!
//! Run with `DATABASE_URL` set and `cargo test -p busline-store -- --ignored`.

use busline_core::booking::BookingStatus;
use busline_core::route::NewRoute;
use busline_core::{LedgerError, SeatLedger};
use busline_store::{DbClient, PostgresLedgerStore};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

async fn postgres_ledger() -> Option<SeatLedger> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres ledger test");
        return None;
    };
    let db = DbClient::new(&url, 10).await.unwrap();
    db.migrate().await.unwrap();
    // generous retry budget so heavy test contention never exhausts it
    Some(SeatLedger::with_max_attempts(
        Arc::new(PostgresLedgerStore::new(db.pool)),
        1_000,
    ))
}

fn new_route(capacity: i32) -> NewRoute {
    NewRoute {
        name: "Volvo Sleeper".to_string(),
        source: "Bangalore".to_string(),
        destination: "Chennai".to_string(),
        departure_time: Utc::now(),
        price_amount: 89900,
        capacity,
    }
}

// Users are unique per run so repeated runs against one database stay isolated.
fn user(n: usize) -> String {
    format!("pg-user-{}-{}", n, Uuid::new_v4())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_postgres_concurrent_bookings_never_oversell() {
    let Some(ledger) = postgres_ledger().await else {
        return;
    };
    let route = ledger.register_route(new_route(20)).await.unwrap();
    let route_id = route.id;
    let users: Vec<String> = (0..60).map(user).collect();

    let mut handles = Vec::new();
    for (i, user) in users.iter().cloned().enumerate() {
        let ledger = ledger.clone();
        let seats = (i % 3) as i32 + 1;
        handles.push(tokio::spawn(async move { ledger.book(route_id, &user, seats).await }));
    }

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(b) => sold += b.seats_booked,
            Err(LedgerError::InsufficientCapacity { .. }) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    let available = ledger.get_availability(route_id).await.unwrap();
    assert!(sold <= 20);
    assert_eq!(available, 20 - sold);
    assert!(available < 3);

    let mut persisted = 0;
    for user in &users {
        for b in ledger.bookings_for_user(user).await.unwrap() {
            if b.route_id == route_id && b.status == BookingStatus::Booked {
                persisted += b.seats_booked;
            }
        }
    }
    assert_eq!(persisted, sold);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_postgres_concurrent_cancels_credit_once() {
    let Some(ledger) = postgres_ledger().await else {
        return;
    };
    let route = ledger.register_route(new_route(10)).await.unwrap();
    let booking = ledger.book(route.id, &user(0), 4).await.unwrap();
    let booking_id = booking.id;
    assert_eq!(ledger.get_availability(route.id).await.unwrap(), 6);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move { ledger.cancel(booking_id).await }));
    }
    for handle in handles {
        let cancelled = handle.await.unwrap().unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    assert_eq!(ledger.get_availability(route.id).await.unwrap(), 10);
}

#[tokio::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_postgres_book_cancel_cancel() {
    let Some(ledger) = postgres_ledger().await else {
        return;
    };
    let route = ledger.register_route(new_route(5)).await.unwrap();

    let booking = ledger.book(route.id, &user(0), 3).await.unwrap();
    assert_eq!(ledger.get_availability(route.id).await.unwrap(), 2);

    let err = ledger.book(route.id, &user(1), 3).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientCapacity { requested: 3, available: 2 }
    ));

    ledger.cancel(booking.id).await.unwrap();
    assert_eq!(ledger.get_availability(route.id).await.unwrap(), 5);

    let again = ledger.cancel(booking.id).await.unwrap();
    assert_eq!(again.status, BookingStatus::Cancelled);
    assert_eq!(ledger.get_availability(route.id).await.unwrap(), 5);
    assert_eq!(
        ledger.booking(booking.id).await.unwrap().status,
        BookingStatus::Cancelled
    );
}
