//! Database queries for invoices and payments

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{conflict_on_unique, AppError, Result};

use super::calculators::{apply_payment, InvoiceStatus};
use super::models::{CreateInvoiceRequest, Invoice, Payment, RecordPaymentRequest};

const INVOICE_COLUMNS: &str = r#"
    id, number, client_name, tour_id, partner_id, currency,
    total_amount, paid_amount, balance_due, status,
    issue_date, due_date, created_at
"#;

pub async fn insert_invoice(
    pool: &PgPool,
    req: &CreateInvoiceRequest,
    default_currency: &str,
) -> Result<Invoice> {
    sqlx::query_as::<_, Invoice>(&format!(
        r#"
        INSERT INTO invoices (
            id, number, client_name, tour_id, partner_id, currency,
            total_amount, paid_amount, balance_due, status, issue_date, due_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $7, $8, $9, $10)
        RETURNING {INVOICE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(req.number.trim())
    .bind(req.client_name.trim())
    .bind(req.tour_id)
    .bind(req.partner_id)
    .bind(req.currency.as_deref().unwrap_or(default_currency))
    .bind(req.total_amount)
    .bind(InvoiceStatus::Unpaid.as_str())
    .bind(req.issue_date.unwrap_or_else(|| Utc::now().date_naive()))
    .bind(req.due_date)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Invoice number already exists"))
}

pub async fn get_invoice(pool: &PgPool, id: Uuid) -> Result<Option<Invoice>> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(invoice)
}

pub async fn list_invoices(pool: &PgPool, status: Option<InvoiceStatus>) -> Result<Vec<Invoice>> {
    let invoices = sqlx::query_as::<_, Invoice>(&format!(
        r#"
        SELECT {INVOICE_COLUMNS}
        FROM invoices
        WHERE ($1::text IS NULL OR status = $1)
        ORDER BY issue_date DESC, number DESC
        "#
    ))
    .bind(status.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(invoices)
}

pub async fn list_payments(pool: &PgPool, invoice_id: Uuid) -> Result<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, invoice_id, amount, method, reference, paid_at
        FROM payments
        WHERE invoice_id = $1
        ORDER BY paid_at
        "#,
    )
    .bind(invoice_id)
    .fetch_all(pool)
    .await?;

    Ok(payments)
}

/// Record a payment and recompute the invoice balance in one transaction.
///
/// The invoice row is locked first so concurrent payments cannot both pass
/// the balance check.
pub async fn record_payment(
    pool: &PgPool,
    invoice_id: Uuid,
    req: &RecordPaymentRequest,
) -> Result<(Invoice, Payment)> {
    let mut tx = pool.begin().await?;

    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 FOR UPDATE"
    ))
    .bind(invoice_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::not_found("Invoice"))?;

    let balance = apply_payment(invoice.total_amount, invoice.paid_amount, req.amount)
        .map_err(AppError::Validation)?;

    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (id, invoice_id, amount, method, reference, paid_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, invoice_id, amount, method, reference, paid_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(invoice_id)
    .bind(balance.paid_amount - invoice.paid_amount)
    .bind(req.method.trim())
    .bind(&req.reference)
    .bind(req.paid_at.unwrap_or_else(Utc::now))
    .fetch_one(&mut *tx)
    .await?;

    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        r#"
        UPDATE invoices
        SET paid_amount = $2,
            balance_due = $3,
            status = $4
        WHERE id = $1
        RETURNING {INVOICE_COLUMNS}
        "#
    ))
    .bind(invoice_id)
    .bind(balance.paid_amount)
    .bind(balance.balance_due)
    .bind(balance.status.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((invoice, payment))
}
