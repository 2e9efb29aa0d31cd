use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rail_core::CoreError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    AuthenticationError(String),
    #[error("{0}")]
    AuthorizationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    NotFoundError(String),
    #[error("{0}")]
    ConflictError(String),
    #[error("{0}")]
    InternalServerError(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::ConflictError(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            CoreError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            CoreError::DuplicateKey(_)
            | CoreError::DuplicateUsername(_)
            | CoreError::Unavailable { .. } => AppError::ConflictError(err.to_string()),
            CoreError::StorageError(_) | CoreError::InternalError(_) => {
                AppError::InternalServerError(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rail_core::SeatCategory;

    #[test]
    fn test_core_errors_map_to_status_codes() {
        let cases = [
            (CoreError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (CoreError::NotFound("Train 1".into()), StatusCode::NOT_FOUND),
            (CoreError::DuplicateKey("1".into()), StatusCode::CONFLICT),
            (CoreError::DuplicateUsername("u".into()), StatusCode::CONFLICT),
            (
                CoreError::Unavailable { train_no: "1".into(), category: SeatCategory::Aisle },
                StatusCode::CONFLICT,
            ),
            (CoreError::StorageError("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (core, expected) in cases {
            assert_eq!(AppError::from(core).status(), expected);
        }
    }

    #[test]
    fn test_unavailable_message_is_plain() {
        let err = AppError::from(CoreError::Unavailable {
            train_no: "12951".into(),
            category: SeatCategory::Window,
        });
        assert_eq!(err.to_string(), "No available window seats on train 12951");
    }
}
