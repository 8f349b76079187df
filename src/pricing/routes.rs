//! Pricing API routes

use axum::{extract::State, routing::post, Json, Router};
use chrono::Utc;

use crate::error::Result;
use crate::models::ApiResponse;
use crate::AppState;

use super::calculators::allocate_per_person;
use super::requests::{AllocateRequest, CalculatePricingRequest, QuoteRequest};
use super::responses::{AllocationResponse, QuoteFiguresResponse, QuoteResponse, TourPricingResponse};
use super::services::{self, MarginRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calculate", post(calculate))
        .route("/quote", post(quote))
        .route("/allocate", post(allocate))
}

async fn calculate(
    State(state): State<AppState>,
    Json(req): Json<CalculatePricingRequest>,
) -> Result<ApiResponse<TourPricingResponse>> {
    let currency = req
        .currency
        .unwrap_or_else(|| state.config.default_currency.clone());
    let as_of = req.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let pricing = services::price_tour(
        &state.db,
        &state.cache,
        &req.tour,
        req.pax,
        req.is_euro_passport,
        as_of,
        &currency,
    )
    .await?;

    Ok(ApiResponse::ok((&pricing).into()))
}

async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<ApiResponse<QuoteResponse>> {
    let currency = req
        .pricing
        .currency
        .unwrap_or_else(|| state.config.default_currency.clone());
    let as_of = req.pricing.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let (pricing, quote) = services::quote_tour(
        &state.db,
        &state.cache,
        &req.pricing.tour,
        req.pricing.pax,
        req.pricing.is_euro_passport,
        as_of,
        &currency,
        MarginRequest {
            requested: req.margin_percent,
            partner_id: req.partner_id,
            default_margin: state.config.default_margin_percent,
        },
    )
    .await?;

    Ok(ApiResponse::ok(QuoteResponse {
        pricing: (&pricing).into(),
        quote: QuoteFiguresResponse::from(&quote),
    }))
}

async fn allocate(
    State(state): State<AppState>,
    Json(req): Json<AllocateRequest>,
) -> Result<ApiResponse<AllocationResponse>> {
    let currency = req
        .currency
        .unwrap_or_else(|| state.config.default_currency.clone());

    let result = allocate_per_person(req.total, req.pax)?;
    Ok(ApiResponse::ok(AllocationResponse::new(&result, &currency)))
}
