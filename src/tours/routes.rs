//! Tour API routes

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ApiResponse, Created, Tour, TourSummary};
use crate::AppState;

use super::queries;
use super::services::{self, TourDetail};

const TOURS_PER_PAGE: i64 = 50;

/// Query parameters for the tour list
#[derive(Debug, Deserialize)]
pub struct TourListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
pub struct SavedTour {
    pub id: Uuid,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    Query(query): Query<TourListQuery>,
) -> Result<ApiResponse<Vec<TourSummary>>> {
    let offset = (query.page.max(1) - 1) * TOURS_PER_PAGE;
    let tours = queries::list_tours(&state.db, TOURS_PER_PAGE, offset).await?;
    Ok(ApiResponse::ok(tours))
}

async fn create(
    State(state): State<AppState>,
    Json(tour): Json<Tour>,
) -> Result<Created<SavedTour>> {
    let id = services::create_tour(&state, &tour).await?;
    Ok(ApiResponse::created(SavedTour { id }))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<TourDetail>> {
    Ok(ApiResponse::ok(services::load_tour(&state, id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(tour): Json<Tour>,
) -> Result<ApiResponse<SavedTour>> {
    services::update_tour(&state, id, &tour).await?;
    Ok(ApiResponse::ok(SavedTour { id }))
}

async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<SavedTour>> {
    if !queries::delete_tour(&state.db, id).await? {
        return Err(AppError::not_found("Tour"));
    }
    tracing::info!(tour_id = %id, "Tour deleted");
    Ok(ApiResponse::ok(SavedTour { id }))
}
