//! Catalog models and typed write requests.
//!
//! Every update request lists exactly the fields that may change; absent
//! fields keep their stored value.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::pricing::models::{PriceBasis, Rate, ServiceCategory};

/// Supplier from the suppliers table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateSupplierRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.kind.trim().is_empty() {
            return Err("kind must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateSupplierRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UpdateSupplierRequest {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err("name must not be empty".to_string());
        }
        if matches!(&self.kind, Some(kind) if kind.trim().is_empty()) {
            return Err("kind must not be empty".to_string());
        }
        Ok(())
    }
}

/// Filters for the supplier list
#[derive(Debug, Default, Deserialize)]
pub struct SupplierFilter {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Service row; category is kept as stored text
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Service {
    pub id: Uuid,
    pub supplier_id: Uuid,
    pub category: String,
    pub name: String,
    pub city: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub category: ServiceCategory,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServiceFilter {
    #[serde(default)]
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub category: Option<ServiceCategory>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRateRequest {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
    pub basis: PriceBasis,
    #[serde(with = "rust_decimal::serde::str")]
    pub eur_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub non_eur_rate: Decimal,
    pub valid_from: NaiveDate,
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    #[serde(default)]
    pub min_pax: Option<i32>,
    #[serde(default)]
    pub max_pax: Option<i32>,
}

impl CreateRateRequest {
    /// Build the rate this request would store
    pub fn into_rate(self, service_id: Uuid, category: ServiceCategory) -> Rate {
        Rate {
            id: Uuid::new_v4(),
            service_id,
            category,
            city: normalize_label(self.city),
            tier: normalize_label(self.tier),
            basis: self.basis,
            eur_rate: stored_amount(self.eur_rate),
            non_eur_rate: stored_amount(self.non_eur_rate),
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            min_pax: self.min_pax,
            max_pax: self.max_pax,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRateRequest {
    #[serde(default)]
    pub basis: Option<PriceBasis>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub eur_rate: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub non_eur_rate: Option<Decimal>,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    /// Absent keeps the stored end, `null` makes the rate open-ended
    #[serde(default, deserialize_with = "present")]
    pub valid_to: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Tell a field sent as `null` apart from a missing one
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateRateRequest {
    /// Apply the present fields on top of a stored rate
    pub fn apply_to(&self, mut rate: Rate) -> Rate {
        if let Some(basis) = self.basis {
            rate.basis = basis;
        }
        if let Some(eur) = self.eur_rate {
            rate.eur_rate = stored_amount(eur);
        }
        if let Some(non_eur) = self.non_eur_rate {
            rate.non_eur_rate = stored_amount(non_eur);
        }
        if let Some(from) = self.valid_from {
            rate.valid_from = from;
        }
        if let Some(valid_to) = self.valid_to {
            rate.valid_to = valid_to;
        }
        if let Some(active) = self.is_active {
            rate.is_active = active;
        }
        rate
    }
}

/// Largest amount a NUMERIC(12, 2) rate column holds
const MAX_RATE: Decimal = dec!(9999999999.99);

/// Round the way the NUMERIC(12, 2) columns store amounts
fn stored_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Trim a free-text scope label; blank means unscoped
fn normalize_label(label: Option<String>) -> Option<String> {
    label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Checks shared by rate create and update
pub fn check_rate(rate: &Rate) -> Result<(), String> {
    if rate.eur_rate < Decimal::ZERO || rate.non_eur_rate < Decimal::ZERO {
        return Err("rates must not be negative".to_string());
    }
    if rate.eur_rate > MAX_RATE || rate.non_eur_rate > MAX_RATE {
        return Err(format!("rates must not exceed {}", MAX_RATE));
    }
    if let Some(end) = rate.valid_to {
        if end < rate.valid_from {
            return Err(format!(
                "valid_to ({}) is before valid_from ({})",
                end, rate.valid_from
            ));
        }
    }
    if rate.min_pax.is_some_and(|min| min < 1) {
        return Err("min_pax must be at least 1".to_string());
    }
    if let (Some(min), Some(max)) = (rate.min_pax, rate.max_pax) {
        if max < min {
            return Err(format!("max_pax ({}) is below min_pax ({})", max, min));
        }
    }
    Ok(())
}

/// Rates that would compete with `rate` for the same days
pub fn conflicting_rates<'a>(rate: &Rate, existing: &'a [Rate]) -> Vec<&'a Rate> {
    existing.iter().filter(|other| rate.conflicts_with(other)).collect()
}

/// One overlapping pair in the data-quality report
#[derive(Debug, Serialize)]
pub struct RateOverlap {
    pub service_id: Uuid,
    pub first: Rate,
    pub second: Rate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateRateRequest {
        CreateRateRequest {
            city: Some("  Luxor ".to_string()),
            tier: Some(String::new()),
            basis: PriceBasis::PerPerson,
            eur_rate: dec!(40),
            non_eur_rate: dec!(55),
            valid_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            valid_to: NaiveDate::from_ymd_opt(2025, 12, 31),
            min_pax: None,
            max_pax: None,
        }
    }

    #[test]
    fn test_into_rate_normalizes_scope() {
        let rate = request().into_rate(Uuid::new_v4(), ServiceCategory::Entrance);
        assert_eq!(rate.city.as_deref(), Some("Luxor"));
        assert_eq!(rate.tier, None);
        assert!(rate.is_active);
        assert!(check_rate(&rate).is_ok());
    }

    #[test]
    fn test_check_rate_rejects_bad_windows_and_bands() {
        let service = Uuid::new_v4();

        let mut rate = request().into_rate(service, ServiceCategory::Entrance);
        rate.valid_to = NaiveDate::from_ymd_opt(2024, 12, 31);
        assert!(check_rate(&rate).is_err());

        let mut rate = request().into_rate(service, ServiceCategory::Entrance);
        rate.min_pax = Some(5);
        rate.max_pax = Some(4);
        assert!(check_rate(&rate).is_err());

        let mut rate = request().into_rate(service, ServiceCategory::Entrance);
        rate.eur_rate = dec!(-1);
        assert!(check_rate(&rate).is_err());
    }

    #[test]
    fn test_conflicting_rates_detects_overlap() {
        let service = Uuid::new_v4();
        let existing = vec![request().into_rate(service, ServiceCategory::Entrance)];

        let mut next_year = request();
        next_year.valid_from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        next_year.valid_to = None;
        let candidate = next_year.into_rate(service, ServiceCategory::Entrance);
        assert!(conflicting_rates(&candidate, &existing).is_empty());

        let mut mid_year = request();
        mid_year.valid_from = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let candidate = mid_year.into_rate(service, ServiceCategory::Entrance);
        assert_eq!(conflicting_rates(&candidate, &existing).len(), 1);
    }

    #[test]
    fn test_conflicting_rates_ignores_label_case() {
        let service = Uuid::new_v4();
        let mut existing_req = request();
        existing_req.city = Some("Cairo".to_string());
        let existing = vec![existing_req.into_rate(service, ServiceCategory::Entrance)];

        let mut lower = request();
        lower.city = Some("cairo".to_string());
        let candidate = lower.into_rate(service, ServiceCategory::Entrance);
        assert_eq!(conflicting_rates(&candidate, &existing).len(), 1);
    }

    #[test]
    fn test_amounts_round_like_the_rate_columns() {
        let mut req = request();
        req.eur_rate = dec!(10.005);
        req.non_eur_rate = dec!(10.015);
        let rate = req.into_rate(Uuid::new_v4(), ServiceCategory::Entrance);
        assert_eq!(rate.eur_rate, dec!(10.01));
        assert_eq!(rate.non_eur_rate, dec!(10.02));

        let update = UpdateRateRequest {
            eur_rate: Some(dec!(7.125)),
            ..Default::default()
        };
        assert_eq!(update.apply_to(rate).eur_rate, dec!(7.13));
    }

    #[test]
    fn test_check_rate_rejects_amounts_beyond_column() {
        let mut rate = request().into_rate(Uuid::new_v4(), ServiceCategory::Entrance);
        rate.eur_rate = dec!(9999999999.99);
        assert!(check_rate(&rate).is_ok());
        rate.eur_rate = dec!(10000000000);
        assert!(check_rate(&rate).is_err());
    }

    #[test]
    fn test_update_valid_to_absent_null_or_date() {
        let rate = request().into_rate(Uuid::new_v4(), ServiceCategory::Meal);

        let keep: UpdateRateRequest = serde_json::from_str(r#"{"eur_rate": "41"}"#).unwrap();
        assert_eq!(keep.valid_to, None);
        assert_eq!(keep.apply_to(rate.clone()).valid_to, rate.valid_to);

        let clear: UpdateRateRequest = serde_json::from_str(r#"{"valid_to": null}"#).unwrap();
        assert_eq!(clear.valid_to, Some(None));
        assert_eq!(clear.apply_to(rate.clone()).valid_to, None);

        let moved: UpdateRateRequest =
            serde_json::from_str(r#"{"valid_to": "2025-06-30"}"#).unwrap();
        assert_eq!(
            moved.apply_to(rate).valid_to,
            NaiveDate::from_ymd_opt(2025, 6, 30)
        );
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let rate = request().into_rate(Uuid::new_v4(), ServiceCategory::Meal);
        let update = UpdateRateRequest {
            eur_rate: Some(dec!(45)),
            is_active: Some(false),
            ..Default::default()
        };
        let updated = update.apply_to(rate.clone());
        assert_eq!(updated.eur_rate, dec!(45));
        assert_eq!(updated.non_eur_rate, rate.non_eur_rate);
        assert!(!updated.is_active);
        assert_eq!(updated.valid_to, rate.valid_to);
    }

    #[test]
    fn test_supplier_update_validation() {
        assert!(UpdateSupplierRequest::default().validate().is_ok());
        let req = UpdateSupplierRequest {
            name: Some("".to_string()),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }
}
