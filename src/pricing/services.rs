//! Pricing service functions with database access.
//!
//! These functions load rates through the cache and database, then hand them
//! to the pure calculators.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::AppError;
use crate::models::Tour;
use crate::partners;

use super::calculators::{
    apply_margin, build_quote, calculate_tour_pricing, check_pax, resolve_margin, QuoteResult,
    TourPricing, MAX_PAX,
};
use super::models::Rate;
use super::queries;
use super::resolver::RateBook;

/// Pricing calculation error types
#[derive(Debug, Clone)]
pub enum PricingError {
    InvalidPax {
        pax: i32,
    },
    InvalidMargin {
        margin_percent: Decimal,
    },
    InvalidAmount {
        amount: Decimal,
    },
    OverlappingRates {
        service_id: String,
        date: String,
        rate_ids: Vec<String>,
    },
    ConfigurationError {
        message: String,
        errors: Vec<String>,
    },
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::InvalidPax { pax } => {
                write!(f, "Passenger count must be between 1 and {} (got {})", MAX_PAX, pax)
            }
            PricingError::InvalidAmount { amount } => {
                write!(f, "Amount {} is outside the supported range", amount)
            }
            PricingError::InvalidMargin { margin_percent } => {
                write!(f, "Margin must be between 0 and 1000 percent (got {})", margin_percent)
            }
            PricingError::OverlappingRates { service_id, date, rate_ids } => write!(
                f,
                "Overlapping active rates for service {} on {}: {}",
                service_id,
                date,
                rate_ids.join(", ")
            ),
            PricingError::ConfigurationError { message, .. } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for PricingError {}

/// Load candidate rates for the given services.
///
/// Cached services are served from memory; the rest are fetched in one query
/// and cached, including services that have no active rates at all.
pub async fn load_rate_book(
    pool: &PgPool,
    cache: &AppCache,
    service_ids: &[Uuid],
) -> Result<RateBook, AppError> {
    let mut book = RateBook::new();
    let mut misses = Vec::new();

    for id in service_ids {
        match cache.rates.get(id).await {
            Some(cached) => {
                tracing::debug!("Cache HIT for rates of service {}", id);
                book.set_service(*id, (*cached).clone());
            }
            None => misses.push(*id),
        }
    }

    if misses.is_empty() {
        return Ok(book);
    }

    tracing::debug!("Cache MISS for rates of {} services", misses.len());
    let mut fetched: HashMap<Uuid, Vec<Rate>> =
        misses.iter().map(|id| (*id, Vec::new())).collect();
    for rate in queries::find_rates_for_services(pool, &misses).await? {
        fetched.entry(rate.service_id).or_default().push(rate);
    }

    for (service_id, rates) in fetched {
        cache.rates.insert(service_id, Arc::new(rates.clone())).await;
        book.set_service(service_id, rates);
    }

    Ok(book)
}

/// Price a tour against the stored rates.
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `cache` - Application cache (for rate lookup)
/// * `tour` - Tour to price; may be incomplete
/// * `pax` - Number of travellers
/// * `is_euro_passport` - Selects the EUR or non-EUR rate column
/// * `as_of` - Date used when the tour has no start date
/// * `currency` - Currency label for the result
pub async fn price_tour(
    pool: &PgPool,
    cache: &AppCache,
    tour: &Tour,
    pax: i32,
    is_euro_passport: bool,
    as_of: NaiveDate,
    currency: &str,
) -> Result<TourPricing, AppError> {
    check_pax(pax)?;

    let book = load_rate_book(pool, cache, &tour.service_ids()).await?;
    let pricing = calculate_tour_pricing(tour, &book, pax, is_euro_passport, as_of, currency)?;

    tracing::debug!(
        days = pricing.days.len(),
        pax,
        grand_total = %pricing.grand_total,
        warnings = pricing.warnings.len(),
        "Tour priced"
    );

    Ok(pricing)
}

/// Margin inputs for a quote
#[derive(Debug, Clone, Copy)]
pub struct MarginRequest {
    pub requested: Option<Decimal>,
    pub partner_id: Option<Uuid>,
    pub default_margin: Decimal,
}

/// Price a tour and turn the cost into a sell-side quote.
///
/// A partner quote uses the partner's negotiated markup unless the request
/// names an explicit margin.
pub async fn quote_tour(
    pool: &PgPool,
    cache: &AppCache,
    tour: &Tour,
    pax: i32,
    is_euro_passport: bool,
    as_of: NaiveDate,
    currency: &str,
    margin: MarginRequest,
) -> Result<(TourPricing, QuoteResult), AppError> {
    check_pax(pax)?;
    if let Some(requested) = margin.requested {
        apply_margin(Decimal::ZERO, requested)?;
    }

    let partner_markup = match (margin.requested, margin.partner_id) {
        (None, Some(partner_id)) => {
            let partner = partners::services::find_active_partner(pool, cache, partner_id).await?;
            Some(partner.markup_percent)
        }
        _ => None,
    };

    let pricing = price_tour(pool, cache, tour, pax, is_euro_passport, as_of, currency).await?;
    let (margin_percent, source) =
        resolve_margin(margin.requested, partner_markup, margin.default_margin);
    let quote = build_quote(&pricing, margin_percent, source)?;

    Ok((pricing, quote))
}
