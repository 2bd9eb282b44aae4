use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub route_id: Uuid,
    pub user_id: String,
    pub seats_booked: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Booked,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booked" => Ok(BookingStatus::Booked),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl Booking {
    pub fn new(route_id: Uuid, user_id: &str, seats_booked: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            route_id,
            user_id: user_id.to_string(),
            seats_booked,
            status: BookingStatus::Booked,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// The same booking after a committed cancellation.
    pub fn into_cancelled(mut self) -> Self {
        self.status = BookingStatus::Cancelled;
        self.updated_at = Utc::now();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_matches_storage_format() {
        assert_eq!(BookingStatus::Booked.to_string(), "booked");
        assert_eq!("cancelled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("CONFIRMED".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&BookingStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_new_booking_is_booked() {
        let route_id = Uuid::new_v4();
        let booking = Booking::new(route_id, "user-1", 3);
        assert_eq!(booking.route_id, route_id);
        assert_eq!(booking.status, BookingStatus::Booked);
        assert!(!booking.is_cancelled());
        assert!(booking.into_cancelled().is_cancelled());
    }
}
