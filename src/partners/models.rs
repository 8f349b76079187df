use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reseller with its own markup
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Partner {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    /// Replaces the default margin on quotes made for this partner
    #[serde(with = "rust_decimal::serde::str")]
    pub markup_percent: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePartnerRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub markup_percent: Decimal,
}

/// Fields that may change; absent fields keep their value
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePartnerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub markup_percent: Option<Decimal>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

pub(crate) fn check_markup(markup: Decimal) -> Result<(), String> {
    if markup < Decimal::ZERO || markup >= Decimal::from(1000) {
        return Err(format!("markup_percent must be between 0 and 1000 (got {})", markup));
    }
    Ok(())
}

impl CreatePartnerRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        check_markup(self.markup_percent)
    }
}

impl UpdatePartnerRequest {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err("name must not be empty".to_string());
        }
        self.markup_percent.map_or(Ok(()), check_markup)
    }
}
