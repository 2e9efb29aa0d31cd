pub mod models;
pub mod pii;

pub use models::events::RailEvent;
pub use pii::Masked;
