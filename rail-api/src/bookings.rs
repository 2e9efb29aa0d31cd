use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Extension,
    Json,
    Router,
};
use rail_core::{Passenger, SeatCategory};
use rail_shared::{Masked, RailEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookTicketRequest {
    pub passenger_name: Masked<String>,
    #[serde(default)]
    pub passenger_age: String,
    #[serde(default)]
    pub passenger_gender: String,
    #[serde(alias = "seat_type")]
    pub category: SeatCategory,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub train_no: String,
    pub seat_number: i64,
    pub category: SeatCategory,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/trains/{train_no}/bookings", post(book_ticket))
}

/// POST /trains/{train_no}/bookings
async fn book_ticket(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(train_no): Path<String>,
    Json(req): Json<BookTicketRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    debug!(?req, user = %claims.sub, "Book ticket");

    let passenger = Passenger {
        name: req.passenger_name,
        age: req.passenger_age,
        gender: req.passenger_gender,
    };

    let allocation = state.railway.book(&train_no, passenger, req.category).await?;
    let train_no = train_no.trim().to_string();

    info!(
        "Seat {} on train {} booked by {}",
        allocation.seat_number, train_no, claims.sub
    );
    state.publish(RailEvent::seat_booked(
        &train_no,
        allocation.seat_number,
        allocation.category.as_str(),
    ));

    Ok((StatusCode::CREATED, Json(BookingResponse {
        train_no,
        seat_number: allocation.seat_number,
        category: allocation.category,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_seat_type_alias_and_masks_name() {
        let req: BookTicketRequest = serde_json::from_str(
            r#"{"passenger_name": "Lakshmi", "passenger_age": "52", "passenger_gender": "Female", "seat_type": "window"}"#,
        )
        .unwrap();

        assert_eq!(req.category, SeatCategory::Window);
        assert_eq!(req.passenger_name.expose(), "Lakshmi");
        assert!(!format!("{:?}", req).contains("Lakshmi"));
    }

    #[test]
    fn test_request_rejects_unknown_category() {
        let parsed = serde_json::from_str::<BookTicketRequest>(
            r#"{"passenger_name": "X", "category": "sleeper"}"#,
        );
        assert!(parsed.is_err());
    }
}
