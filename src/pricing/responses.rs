//! Response DTOs for pricing API endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::calculators::{
    AllocationResult, CategoryBreakdown, DayPricing, MarginSource, QuoteResult, TourPricing,
};
use super::models::RateColumn;

/// Money value for JSON responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Cost per category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub accommodation: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub guides: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub transport: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub entrances: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub meals: Decimal,
}

impl From<&CategoryBreakdown> for BreakdownResponse {
    fn from(b: &CategoryBreakdown) -> Self {
        Self {
            accommodation: b.accommodation,
            guides: b.guides,
            transport: b.transport,
            entrances: b.entrances,
            meals: b.meals,
        }
    }
}

/// One priced day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayPricingResponse {
    pub day_number: i32,
    pub date: NaiveDate,
    pub city: String,
    pub breakdown: BreakdownResponse,
    pub total: MoneyResponse,
}

/// Response for tour pricing; also stored as the tour's pricing snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourPricingResponse {
    pub pax: i32,
    pub rate_column: String,
    pub days: Vec<DayPricingResponse>,
    pub category_totals: BreakdownResponse,
    pub grand_total: MoneyResponse,
    pub per_person: MoneyResponse,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl From<&TourPricing> for TourPricingResponse {
    fn from(p: &TourPricing) -> Self {
        let currency = p.currency.as_str();
        let day = |d: &DayPricing| DayPricingResponse {
            day_number: d.day_number,
            date: d.date,
            city: d.city.clone(),
            breakdown: (&d.breakdown).into(),
            total: MoneyResponse::new(d.total, currency),
        };

        Self {
            pax: p.pax,
            rate_column: match p.rate_column {
                RateColumn::Eur => "eur".to_string(),
                RateColumn::NonEur => "non_eur".to_string(),
            },
            days: p.days.iter().map(day).collect(),
            category_totals: (&p.category_totals).into(),
            grand_total: MoneyResponse::new(p.grand_total, currency),
            per_person: MoneyResponse::new(p.per_person, currency),
            warnings: p.warnings.clone(),
        }
    }
}

/// Sell-side figures of a quote
#[derive(Debug, Serialize)]
pub struct QuoteFiguresResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub margin_percent: Decimal,
    pub margin_source: MarginSource,
    pub cost_total: MoneyResponse,
    pub cost_per_person: MoneyResponse,
    pub sell_total: MoneyResponse,
    pub sell_per_person: MoneyResponse,
    pub profit: MoneyResponse,
}

impl From<&QuoteResult> for QuoteFiguresResponse {
    fn from(q: &QuoteResult) -> Self {
        let currency = q.currency.as_str();
        Self {
            margin_percent: q.margin_percent,
            margin_source: q.margin_source,
            cost_total: MoneyResponse::new(q.cost_total, currency),
            cost_per_person: MoneyResponse::new(q.cost_per_person, currency),
            sell_total: MoneyResponse::new(q.sell_total, currency),
            sell_per_person: MoneyResponse::new(q.sell_per_person, currency),
            profit: MoneyResponse::new(q.profit, currency),
        }
    }
}

/// Response for a quote
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub pricing: TourPricingResponse,
    pub quote: QuoteFiguresResponse,
}

/// Response for a per-person allocation
#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub per_person: MoneyResponse,
    pub amounts: Vec<MoneyResponse>,
}

impl AllocationResponse {
    pub fn new(result: &AllocationResult, currency: &str) -> Self {
        Self {
            per_person: MoneyResponse::new(result.per_person, currency),
            amounts: result
                .amounts
                .iter()
                .map(|amount| MoneyResponse::new(*amount, currency))
                .collect(),
        }
    }
}
