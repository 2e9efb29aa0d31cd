use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use rail_core::repository::SeatRepository;
use rail_core::{Availability, CoreError, CoreResult, Passenger, Seat, SeatCategory};

use crate::storage_error;

pub struct SqliteSeatRepository {
    pool: SqlitePool,
}

impl SqliteSeatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    seat_number: i64,
    seat_type: String,
    booked: bool,
    passenger_name: String,
    passenger_age: String,
    passenger_gender: String,
    booked_at: Option<DateTime<Utc>>,
}

impl TryFrom<SeatRow> for Seat {
    type Error = CoreError;

    fn try_from(row: SeatRow) -> Result<Self, Self::Error> {
        let category = row
            .seat_type
            .parse::<SeatCategory>()
            .map_err(|_| CoreError::StorageError(format!("Corrupt seat type: {}", row.seat_type)))?;

        Ok(Seat {
            seat_number: row.seat_number,
            category,
            booked: row.booked,
            passenger_name: row.passenger_name,
            passenger_age: row.passenger_age,
            passenger_gender: row.passenger_gender,
            booked_at: row.booked_at,
        })
    }
}

#[async_trait]
impl SeatRepository for SqliteSeatRepository {
    async fn list_seats(&self, train_no: &str) -> CoreResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            r#"
            SELECT seat_number, seat_type, booked, passenger_name, passenger_age, passenger_gender, booked_at
            FROM seats
            WHERE train_no = ?
            ORDER BY seat_number ASC
            "#,
        )
        .bind(train_no)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(Seat::try_from).collect()
    }

    async fn claim_seat(
        &self,
        train_no: &str,
        category: SeatCategory,
        passenger: &Passenger,
    ) -> CoreResult<Option<i64>> {
        // Selection and marking in one statement: no other writer can take
        // the same seat between the SELECT and the UPDATE.
        let claimed: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE seats
            SET booked = 1,
                passenger_name = ?,
                passenger_age = ?,
                passenger_gender = ?,
                booked_at = ?
            WHERE train_no = ?
              AND booked = 0
              AND seat_number = (
                  SELECT seat_number FROM seats
                  WHERE train_no = ? AND seat_type = ? AND booked = 0
                  ORDER BY seat_number ASC
                  LIMIT 1
              )
            RETURNING seat_number
            "#,
        )
        .bind(passenger.name.expose().as_str())
        .bind(passenger.age.as_str())
        .bind(passenger.gender.as_str())
        .bind(Utc::now())
        .bind(train_no)
        .bind(train_no)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(claimed.map(|(seat_number,)| seat_number))
    }

    async fn availability(&self, train_no: &str) -> CoreResult<Availability> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT seat_type, COUNT(*)
            FROM seats
            WHERE train_no = ? AND booked = 0
            GROUP BY seat_type
            "#,
        )
        .bind(train_no)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let mut availability = Availability::default();
        for (seat_type, free) in rows {
            let category = seat_type
                .parse::<SeatCategory>()
                .map_err(|_| CoreError::StorageError(format!("Corrupt seat type: {}", seat_type)))?;
            availability.set(category, free as u32);
        }
        Ok(availability)
    }
}
