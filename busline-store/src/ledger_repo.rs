use async_trait::async_trait;
use busline_core::booking::{Booking, BookingStatus};
use busline_core::repository::{LedgerStore, StoreResult};
use busline_core::route::{Route, RouteDetails};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RouteRow {
    id: Uuid,
    name: String,
    source: String,
    destination: String,
    departure_time: DateTime<Utc>,
    price_amount: i32,
    capacity: i32,
    available_seats: i32,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RouteRow> for Route {
    fn from(row: RouteRow) -> Self {
        Route {
            id: row.id,
            name: row.name,
            source: row.source,
            destination: row.destination,
            departure_time: row.departure_time,
            price_amount: row.price_amount,
            capacity: row.capacity,
            available_seats: row.available_seats,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    route_id: Uuid,
    user_id: String,
    seats_booked: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = busline_core::booking::UnknownStatus;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            route_id: row.route_id,
            user_id: row.user_id,
            seats_booked: row.seats_booked,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const ROUTE_COLUMNS: &str = "id, name, source, destination, departure_time, price_amount, \
     capacity, available_seats, version, created_at, updated_at";

const BOOKING_COLUMNS: &str = "id, route_id, user_id, seats_booked, status, created_at, updated_at";

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn insert_route(&self, route: &Route) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO routes (id, name, source, destination, departure_time, price_amount,
                                capacity, available_seats, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(route.id)
        .bind(&route.name)
        .bind(&route.source)
        .bind(&route.destination)
        .bind(route.departure_time)
        .bind(route.price_amount)
        .bind(route.capacity)
        .bind(route.available_seats)
        .bind(route.version)
        .bind(route.created_at)
        .bind(route.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_route(&self, id: Uuid) -> StoreResult<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes WHERE id = $1",
            ROUTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Route::from))
    }

    async fn list_routes(&self) -> StoreResult<Vec<Route>> {
        let rows = sqlx::query_as::<_, RouteRow>(&format!(
            "SELECT {} FROM routes ORDER BY departure_time, id",
            ROUTE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Route::from).collect())
    }

    async fn update_route_details(
        &self,
        id: Uuid,
        details: &RouteDetails,
    ) -> StoreResult<Option<Route>> {
        let row = sqlx::query_as::<_, RouteRow>(&format!(
            r#"
            UPDATE routes
            SET name = $2, source = $3, destination = $4, departure_time = $5,
                price_amount = $6, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            ROUTE_COLUMNS
        ))
        .bind(id)
        .bind(&details.name)
        .bind(&details.source)
        .bind(&details.destination)
        .bind(details.departure_time)
        .bind(details.price_amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Route::from))
    }

    async fn commit_booking(&self, booking: &Booking, expected_version: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let taken = sqlx::query(
            r#"
            UPDATE routes
            SET available_seats = available_seats - $2, version = version + 1, updated_at = now()
            WHERE id = $1 AND version = $3 AND available_seats >= $2
            "#,
        )
        .bind(booking.route_id)
        .bind(booking.seats_booked)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if taken.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (id, route_id, user_id, seats_booked, status,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(booking.id)
        .bind(booking.route_id)
        .bind(&booking.user_id)
        .bind(booking.seats_booked)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn get_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Booking::try_from).transpose()?)
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(bookings)
    }

    async fn commit_cancellation(
        &self,
        booking: &Booking,
        expected_version: i64,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        // The status guard makes a second cancel a no-op.
        let flipped = sqlx::query(
            r#"
            UPDATE bookings SET status = $2, updated_at = now()
            WHERE id = $1 AND status = $3
            "#,
        )
        .bind(booking.id)
        .bind(BookingStatus::Cancelled.as_str())
        .bind(BookingStatus::Booked.as_str())
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let credited = sqlx::query(
            r#"
            UPDATE routes
            SET available_seats = available_seats + $2, version = version + 1, updated_at = now()
            WHERE id = $1 AND version = $3
            "#,
        )
        .bind(booking.route_id)
        .bind(booking.seats_booked)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if credited.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
