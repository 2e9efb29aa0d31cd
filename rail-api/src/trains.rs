use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Extension,
    Json,
    Router,
};
use rail_core::{Availability, NewTrain, Seat, Train, SEATS_PER_TRAIN};
use rail_shared::RailEvent;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::middleware::{admin_auth_middleware, Claims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    #[serde(flatten)]
    pub train: Train,
    pub seats_provisioned: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub number: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub train_no: String,
    #[serde(flatten)]
    pub free: Availability,
    pub total_free: u32,
}

/// Train routes. Registration and removal additionally require the admin role.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/trains",
            get(list_trains).merge(
                post(register_train).route_layer(middleware::from_fn(admin_auth_middleware)),
            ),
        )
        .route("/trains/search", get(search_train))
        .route(
            "/trains/{train_no}",
            delete(remove_train).route_layer(middleware::from_fn(admin_auth_middleware)),
        )
        .route("/trains/{train_no}/seats", get(view_seats))
        .route("/trains/{train_no}/availability", get(availability))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /trains
async fn register_train(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewTrain>,
) -> Result<(StatusCode, Json<TrainResponse>), AppError> {
    let train = state.railway.register(req).await?;
    info!("Train {} registered by {}", train.number, claims.sub);

    state.publish(RailEvent::train_registered(&train.number, SEATS_PER_TRAIN));

    Ok((StatusCode::CREATED, Json(TrainResponse {
        train,
        seats_provisioned: SEATS_PER_TRAIN,
    })))
}

/// GET /trains
async fn list_trains(State(state): State<AppState>) -> Result<Json<Vec<Train>>, AppError> {
    Ok(Json(state.railway.list().await?))
}

/// GET /trains/search?number=..&name=..
async fn search_train(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Train>, AppError> {
    let train = state.railway.search(&query.number, query.name.as_deref()).await?;
    Ok(Json(train))
}

/// DELETE /trains/{train_no}
async fn remove_train(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(train_no): Path<String>,
) -> Result<StatusCode, AppError> {
    state.railway.remove(&train_no).await?;
    info!("Train {} removed by {}", train_no.trim(), claims.sub);

    state.publish(RailEvent::train_removed(train_no.trim()));
    Ok(StatusCode::NO_CONTENT)
}

/// GET /trains/{train_no}/seats
async fn view_seats(
    State(state): State<AppState>,
    Path(train_no): Path<String>,
) -> Result<Json<Vec<Seat>>, AppError> {
    Ok(Json(state.railway.seats(&train_no).await?))
}

/// GET /trains/{train_no}/availability
async fn availability(
    State(state): State<AppState>,
    Path(train_no): Path<String>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let free = state.railway.availability(&train_no).await?;
    Ok(Json(AvailabilityResponse {
        train_no: train_no.trim().to_string(),
        total_free: free.total(),
        free,
    }))
}
