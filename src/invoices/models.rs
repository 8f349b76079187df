use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::calculators::InvoiceStatus;

/// Invoice from the invoices table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub client_name: String,
    pub tour_id: Option<Uuid>,
    pub partner_id: Option<Uuid>,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub paid_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub balance_due: Decimal,
    pub status: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Payment from the payments table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub method: String,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub number: String,
    pub client_name: String,
    #[serde(default)]
    pub tour_id: Option<Uuid>,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl CreateInvoiceRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.number.trim().is_empty() {
            return Err("number must not be empty".to_string());
        }
        if self.client_name.trim().is_empty() {
            return Err("client_name must not be empty".to_string());
        }
        if self.total_amount <= Decimal::ZERO {
            return Err("total_amount must be positive".to_string());
        }
        if let (Some(issue), Some(due)) = (self.issue_date, self.due_date) {
            if due < issue {
                return Err("due_date is before issue_date".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct RecordPaymentRequest {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub method: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}
