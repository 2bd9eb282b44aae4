pub mod booking;
pub mod ledger;
pub mod memory;
pub mod repository;
pub mod route;

pub use booking::{Booking, BookingStatus};
pub use ledger::SeatLedger;
pub use memory::InMemoryLedgerStore;
pub use repository::{LedgerStore, StoreError, StoreResult};
pub use route::{NewRoute, Route, RouteDetails};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Not enough available seats: requested {requested}, available {available}")]
    InsufficientCapacity { requested: i32, available: i32 },
    #[error("Seat update kept conflicting, gave up after {attempts} attempts")]
    ConflictRetryExhausted { attempts: u32 },
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    pub(crate) fn route_not_found(id: uuid::Uuid) -> Self {
        LedgerError::NotFound { entity: "Route", id: id.to_string() }
    }

    pub(crate) fn booking_not_found(id: uuid::Uuid) -> Self {
        LedgerError::NotFound { entity: "Booking", id: id.to_string() }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
