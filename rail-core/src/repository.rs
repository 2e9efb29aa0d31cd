use async_trait::async_trait;

use crate::identity::{Role, UserRecord};
use crate::seat::{Availability, Passenger, Seat, SeatCategory};
use crate::train::{NewTrain, Train};
use crate::CoreResult;

/// Repository trait for train records and their seats.
///
/// `register` and `remove` cover the train row and its whole seat set, so an
/// implementation must run each as one atomic unit.
#[async_trait]
pub trait TrainRepository: Send + Sync {
    /// Inserts the train and provisions its seats. Fails with `DuplicateKey`
    /// when the number is taken, leaving the existing seats alone.
    async fn register(&self, train: &NewTrain) -> CoreResult<Train>;

    async fn find(&self, number: &str) -> CoreResult<Option<Train>>;

    async fn list(&self) -> CoreResult<Vec<Train>>;

    /// Deletes the train and its seats. Returns `false` when nothing matched.
    async fn remove(&self, number: &str) -> CoreResult<bool>;
}

/// Repository trait for seat data access
#[async_trait]
pub trait SeatRepository: Send + Sync {
    /// All seats of a train ordered by seat number; empty when the train is unknown.
    async fn list_seats(&self, train_no: &str) -> CoreResult<Vec<Seat>>;

    /// Claims the lowest-numbered unbooked seat of `category` and records the
    /// passenger on it in a single atomic step. `None` when no seat qualifies.
    async fn claim_seat(
        &self,
        train_no: &str,
        category: SeatCategory,
        passenger: &Passenger,
    ) -> CoreResult<Option<i64>>;

    async fn availability(&self, train_no: &str) -> CoreResult<Availability>;
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateUsername` when the name is taken.
    async fn create_user(&self, username: &str, password_hash: &str, role: Role) -> CoreResult<()>;

    async fn get_user(&self, username: &str) -> CoreResult<Option<UserRecord>>;
}
