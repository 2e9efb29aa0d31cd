pub mod seat;
pub mod train;
pub mod repository;
pub mod locks;
pub mod identity;
pub mod railway;

pub use seat::{Seat, SeatCategory, Passenger, SeatAllocation, Availability, SEATS_PER_TRAIN};
pub use train::{Train, NewTrain};
pub use identity::{Role, UserService};
pub use railway::RailwayService;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Train {0} already exists")]
    DuplicateKey(String),
    #[error("Username {0} is already taken")]
    DuplicateUsername(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("No available {category} seats on train {train_no}")]
    Unavailable {
        train_no: String,
        category: SeatCategory,
    },
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
