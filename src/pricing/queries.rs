//! Database queries for the pricing engine.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{Rate, RateRow};

pub(crate) const RATE_COLUMNS: &str = r#"
    id, service_id, category, city, tier, basis,
    eur_rate, non_eur_rate, valid_from, valid_to,
    min_pax, max_pax, is_active, created_at
"#;

/// Check rows read from the database
pub fn into_rates(rows: Vec<RateRow>) -> Result<Vec<Rate>, AppError> {
    rows.into_iter()
        .map(|row| {
            let id = row.id;
            Rate::try_from(row).map_err(|e| AppError::Internal(format!("Rate {}: {}", id, e)))
        })
        .collect()
}

/// Active rates for a set of services
pub async fn find_rates_for_services(
    pool: &PgPool,
    service_ids: &[Uuid],
) -> Result<Vec<Rate>, AppError> {
    let rows = sqlx::query_as::<_, RateRow>(&format!(
        r#"
        SELECT {RATE_COLUMNS}
        FROM rates
        WHERE service_id = ANY($1)
          AND is_active = true
        ORDER BY service_id, valid_from
        "#
    ))
    .bind(service_ids)
    .fetch_all(pool)
    .await?;

    into_rates(rows)
}

/// Get all active rates (for cache warming and overlap reports)
pub async fn get_active_rates(pool: &PgPool) -> Result<Vec<Rate>, AppError> {
    let rows = sqlx::query_as::<_, RateRow>(&format!(
        r#"
        SELECT {RATE_COLUMNS}
        FROM rates
        WHERE is_active = true
        ORDER BY service_id, valid_from
        "#
    ))
    .fetch_all(pool)
    .await?;

    into_rates(rows)
}
