//! Partner API routes

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ApiResponse, Created};
use crate::AppState;

use super::models::{CreatePartnerRequest, Partner, UpdatePartnerRequest};
use super::queries;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail).put(update))
}

async fn list(State(state): State<AppState>) -> Result<ApiResponse<Vec<Partner>>> {
    Ok(ApiResponse::ok(queries::list_partners(&state.db).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreatePartnerRequest>,
) -> Result<Created<Partner>> {
    req.validate().map_err(AppError::Validation)?;
    let partner = queries::insert_partner(&state.db, &req).await?;
    tracing::info!("Partner created: {} ({})", partner.name, partner.id);
    Ok(ApiResponse::created(partner))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Partner>> {
    let partner = queries::get_partner(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Partner"))?;
    Ok(ApiResponse::ok(partner))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePartnerRequest>,
) -> Result<ApiResponse<Partner>> {
    req.validate().map_err(AppError::Validation)?;
    let partner = queries::update_partner(&state.db, id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Partner"))?;
    state.cache.partners.invalidate(&id).await;
    Ok(ApiResponse::ok(partner))
}
