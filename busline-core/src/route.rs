use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, LedgerResult};

/// A bus route with its seat inventory.
///
/// `capacity` is fixed when the route is registered. `available_seats` only
/// moves through bookings and cancellations, and every such move bumps
/// `version` so concurrent writers can detect each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub price_amount: i32,
    pub capacity: i32,
    pub available_seats: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an administrator supplies when adding a bus.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoute {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub price_amount: i32,
    pub capacity: i32,
}

/// Descriptive fields that may be edited after creation. Seat counts are not.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteDetails {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub price_amount: i32,
}

impl NewRoute {
    pub fn validate(&self) -> LedgerResult<()> {
        require_text("name", &self.name)?;
        require_text("source", &self.source)?;
        require_text("destination", &self.destination)?;
        if self.capacity <= 0 {
            return Err(LedgerError::InvalidInput(format!(
                "capacity must be positive, got {}",
                self.capacity
            )));
        }
        require_price(self.price_amount)
    }

    /// Builds a fresh route with every seat available.
    pub fn into_route(self) -> Route {
        let now = Utc::now();
        Route {
            id: Uuid::new_v4(),
            name: self.name,
            source: self.source,
            destination: self.destination,
            departure_time: self.departure_time,
            price_amount: self.price_amount,
            capacity: self.capacity,
            available_seats: self.capacity,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

impl RouteDetails {
    pub fn validate(&self) -> LedgerResult<()> {
        require_text("name", &self.name)?;
        require_text("source", &self.source)?;
        require_text("destination", &self.destination)?;
        require_price(self.price_amount)
    }
}

impl Route {
    pub fn booked_seats(&self) -> i32 {
        self.capacity - self.available_seats
    }
}

fn require_text(field: &str, value: &str) -> LedgerResult<()> {
    if value.trim().is_empty() {
        return Err(LedgerError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn require_price(price_amount: i32) -> LedgerResult<()> {
    if price_amount < 0 {
        return Err(LedgerError::InvalidInput(format!(
            "price_amount must not be negative, got {}",
            price_amount
        )));
    }
    Ok(())
}
