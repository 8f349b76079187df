//! Catalog API routes

use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ApiResponse, Created};
use crate::pricing::models::Rate;
use crate::AppState;

use super::models::{
    CreateRateRequest, CreateServiceRequest, CreateSupplierRequest, RateOverlap, Service,
    ServiceFilter, Supplier, SupplierFilter, UpdateRateRequest, UpdateSupplierRequest,
};
use super::{queries, services};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/:id",
            get(supplier_detail).put(update_supplier).delete(deactivate_supplier),
        )
        .route("/suppliers/:id/services", post(create_service))
        .route("/services", get(list_services))
        .route("/services/:id/rates", get(list_rates).post(create_rate))
        .route("/rates/overlaps", get(rate_overlaps))
        .route("/rates/:id", put(update_rate).delete(deactivate_rate))
}

async fn list_suppliers(
    State(state): State<AppState>,
    Query(filter): Query<SupplierFilter>,
) -> Result<ApiResponse<Vec<Supplier>>> {
    Ok(ApiResponse::ok(queries::list_suppliers(&state.db, &filter).await?))
}

async fn create_supplier(
    State(state): State<AppState>,
    Json(req): Json<CreateSupplierRequest>,
) -> Result<Created<Supplier>> {
    req.validate().map_err(AppError::Validation)?;
    let supplier = queries::insert_supplier(&state.db, &req).await?;
    tracing::info!("Supplier created: {} ({})", supplier.name, supplier.id);
    Ok(ApiResponse::created(supplier))
}

async fn supplier_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Supplier>> {
    let supplier = queries::get_supplier(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Supplier"))?;
    Ok(ApiResponse::ok(supplier))
}

async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSupplierRequest>,
) -> Result<ApiResponse<Supplier>> {
    req.validate().map_err(AppError::Validation)?;
    let supplier = queries::update_supplier(&state.db, id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Supplier"))?;
    Ok(ApiResponse::ok(supplier))
}

async fn deactivate_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Supplier>> {
    let req = UpdateSupplierRequest {
        is_active: Some(false),
        ..Default::default()
    };
    let supplier = queries::update_supplier(&state.db, id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Supplier"))?;
    tracing::info!("Supplier deactivated: {}", id);
    Ok(ApiResponse::ok(supplier))
}

async fn create_service(
    State(state): State<AppState>,
    Path(supplier_id): Path<Uuid>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<Created<Service>> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    queries::get_supplier(&state.db, supplier_id)
        .await?
        .ok_or_else(|| AppError::not_found("Supplier"))?;
    let service = queries::insert_service(&state.db, supplier_id, &req).await?;
    Ok(ApiResponse::created(service))
}

async fn list_services(
    State(state): State<AppState>,
    Query(filter): Query<ServiceFilter>,
) -> Result<ApiResponse<Vec<Service>>> {
    let services = queries::list_services(&state.db, filter.supplier_id, filter.category).await?;
    Ok(ApiResponse::ok(services))
}

async fn list_rates(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
) -> Result<ApiResponse<Vec<Rate>>> {
    Ok(ApiResponse::ok(queries::list_rates(&state.db, service_id).await?))
}

async fn create_rate(
    State(state): State<AppState>,
    Path(service_id): Path<Uuid>,
    Json(req): Json<CreateRateRequest>,
) -> Result<Created<Rate>> {
    let rate = services::create_rate(&state, service_id, req).await?;
    Ok(ApiResponse::created(rate))
}

async fn update_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRateRequest>,
) -> Result<ApiResponse<Rate>> {
    Ok(ApiResponse::ok(services::update_rate(&state, id, &req).await?))
}

async fn deactivate_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Rate>> {
    let req = UpdateRateRequest {
        is_active: Some(false),
        ..Default::default()
    };
    Ok(ApiResponse::ok(services::update_rate(&state, id, &req).await?))
}

async fn rate_overlaps(State(state): State<AppState>) -> Result<ApiResponse<Vec<RateOverlap>>> {
    Ok(ApiResponse::ok(services::overlap_report(&state).await?))
}
