use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use rail_core::repository::TrainRepository;
use rail_core::seat::seat_plan;
use rail_core::{CoreError, CoreResult, NewTrain, Train, SEATS_PER_TRAIN};

use crate::{is_unique_violation, storage_error};

pub struct SqliteTrainRepository {
    pool: SqlitePool,
}

impl SqliteTrainRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TrainRow {
    train_no: String,
    train_name: String,
    start_destination: Option<String>,
    end_destination: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TrainRow> for Train {
    fn from(row: TrainRow) -> Self {
        Train {
            number: row.train_no,
            name: row.train_name,
            origin: row.start_destination,
            destination: row.end_destination,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TrainRepository for SqliteTrainRepository {
    async fn register(&self, train: &NewTrain) -> CoreResult<Train> {
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO trains (train_no, train_name, start_destination, end_destination, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(train.number.as_str())
        .bind(train.name.as_str())
        .bind(train.origin.as_deref())
        .bind(train.destination.as_deref())
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::DuplicateKey(train.number.clone())
            } else {
                storage_error(e)
            }
        })?;

        let mut seats: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO seats (train_no, seat_number, seat_type, booked) ");
        seats.push_values(seat_plan(), |mut row, (seat_number, category)| {
            row.push_bind(train.number.clone())
                .push_bind(seat_number as i64)
                .push_bind(category.as_str())
                .push_bind(false);
        });

        let inserted = seats
            .build()
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?
            .rows_affected();

        if inserted != SEATS_PER_TRAIN as u64 {
            // Dropping the transaction rolls the train row back as well.
            return Err(CoreError::StorageError(format!(
                "Provisioned {} of {} seats for train {}",
                inserted, SEATS_PER_TRAIN, train.number
            )));
        }

        tx.commit().await.map_err(storage_error)?;
        debug!("Provisioned {} seats for train {}", inserted, train.number);

        Ok(Train {
            number: train.number.clone(),
            name: train.name.clone(),
            origin: train.origin.clone(),
            destination: train.destination.clone(),
            created_at,
        })
    }

    async fn find(&self, number: &str) -> CoreResult<Option<Train>> {
        let row = sqlx::query_as::<_, TrainRow>(
            "SELECT train_no, train_name, start_destination, end_destination, created_at FROM trains WHERE train_no = ?",
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Train::from))
    }

    async fn list(&self) -> CoreResult<Vec<Train>> {
        let rows = sqlx::query_as::<_, TrainRow>(
            "SELECT train_no, train_name, start_destination, end_destination, created_at FROM trains ORDER BY train_no ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Train::from).collect())
    }

    async fn remove(&self, number: &str) -> CoreResult<bool> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let seats_deleted = sqlx::query("DELETE FROM seats WHERE train_no = ?")
            .bind(number)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?
            .rows_affected();

        let trains_deleted = sqlx::query("DELETE FROM trains WHERE train_no = ?")
            .bind(number)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?
            .rows_affected();

        if trains_deleted == 0 {
            tx.rollback().await.map_err(storage_error)?;
            return Ok(false);
        }

        tx.commit().await.map_err(storage_error)?;
        debug!("Deleted train {} with {} seats", number, seats_deleted);
        Ok(true)
    }
}
