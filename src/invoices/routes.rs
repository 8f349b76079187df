//! Invoice API routes

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{ApiResponse, Created};
use crate::AppState;

use super::models::{
    CreateInvoiceRequest, Invoice, InvoiceDetail, InvoiceFilter, Payment, RecordPaymentRequest,
};
use super::queries;

#[derive(Debug, Serialize)]
pub struct PaymentRecorded {
    pub invoice: Invoice,
    pub payment: Payment,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(detail))
        .route("/:id/payments", post(record_payment))
}

async fn list(
    State(state): State<AppState>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<ApiResponse<Vec<Invoice>>> {
    Ok(ApiResponse::ok(queries::list_invoices(&state.db, filter.status).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<Created<Invoice>> {
    req.validate().map_err(AppError::Validation)?;
    let invoice = queries::insert_invoice(&state.db, &req, &state.config.default_currency).await?;
    tracing::info!("Invoice {} issued to {}", invoice.number, invoice.client_name);
    Ok(ApiResponse::created(invoice))
}

async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<InvoiceDetail>> {
    let invoice = queries::get_invoice(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Invoice"))?;
    let payments = queries::list_payments(&state.db, id).await?;
    Ok(ApiResponse::ok(InvoiceDetail { invoice, payments }))
}

async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<Created<PaymentRecorded>> {
    if req.method.trim().is_empty() {
        return Err(AppError::validation("method must not be empty"));
    }
    let (invoice, payment) = queries::record_payment(&state.db, id, &req).await?;
    tracing::info!(
        invoice = %invoice.number,
        status = %invoice.status,
        balance_due = %invoice.balance_due,
        "Payment recorded"
    );
    Ok(ApiResponse::created(PaymentRecorded { invoice, payment }))
}
