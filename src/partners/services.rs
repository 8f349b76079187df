//! Cached partner lookups used by quoting

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::{AppError, Result};

use super::models::Partner;
use super::queries;

/// Load a partner that may receive quotes
pub async fn find_active_partner(pool: &PgPool, cache: &AppCache, id: Uuid) -> Result<Arc<Partner>> {
    let partner = match cache.partners.get(&id).await {
        Some(cached) => {
            tracing::debug!("Cache HIT for partner: {}", id);
            cached
        }
        None => {
            tracing::debug!("Cache MISS for partner: {}", id);
            let partner = Arc::new(
                queries::get_partner(pool, id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Partner"))?,
            );
            cache.partners.insert(id, partner.clone()).await;
            partner
        }
    };

    if !partner.is_active {
        return Err(AppError::validation(format!(
            "Partner {} is inactive",
            partner.name
        )));
    }

    Ok(partner)
}
