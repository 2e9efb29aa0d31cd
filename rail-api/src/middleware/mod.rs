pub mod auth;

pub use auth::{user_auth_middleware, admin_auth_middleware, Claims};
