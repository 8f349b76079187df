//! Request DTOs for pricing API endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::models::Tour;

/// Request to price a tour
#[derive(Debug, Deserialize)]
pub struct CalculatePricingRequest {
    pub tour: Tour,
    pub pax: i32,
    #[serde(default)]
    pub is_euro_passport: bool,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Request to price a tour and quote a sell price
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub pricing: CalculatePricingRequest,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub margin_percent: Option<Decimal>,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
}

/// Request to split a total across travellers
#[derive(Debug, Deserialize)]
pub struct AllocateRequest {
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
    pub pax: i32,
    #[serde(default)]
    pub currency: Option<String>,
}
