//! In-memory caching using moka
//!
//! Rates change rarely compared to how often tours are re-priced while an
//! itinerary is being edited, so rate rows are cached per service.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::partners::Partner;
use crate::pricing::models::Rate;
use crate::pricing::queries;

/// Application cache holding rate rows and partners
#[derive(Clone)]
pub struct AppCache {
    /// Active rates (service_id -> rates, possibly empty)
    pub rates: Cache<Uuid, Arc<Vec<Rate>>>,
    /// B2B partners (partner_id -> Partner)
    pub partners: Cache<Uuid, Arc<Partner>>,
}

impl AppCache {
    /// Create a new cache instance with the given rate TTL
    pub fn new(rate_ttl: Duration) -> Self {
        Self {
            // Rates: up to 10k services, idle entries dropped after half the TTL
            rates: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(rate_ttl)
                .time_to_idle(rate_ttl / 2)
                .build(),

            // Partners: 500 entries, 30 min TTL
            partners: Cache::builder()
                .max_capacity(500)
                .time_to_live(Duration::from_secs(30 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            rate_services: self.rates.entry_count(),
            partners: self.partners.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.rates.invalidate_all();
        self.partners.invalidate_all();
        info!("All caches invalidated");
    }

    /// Drop cached rates of one service after a rate write
    pub async fn invalidate_rates(&self, service_id: Uuid) {
        self.rates.invalidate(&service_id).await;
        info!("Rate cache invalidated for service: {}", service_id);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(10 * 60))
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub rate_services: u64,
    pub partners: u64,
}

/// Start background cache warmer
///
/// Warms the rate cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        // First tick completes immediately
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Preload every active rate grouped by service
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match queries::get_active_rates(db).await {
        Ok(rates) => {
            let mut by_service: HashMap<Uuid, Vec<Rate>> = HashMap::new();
            for rate in rates {
                by_service.entry(rate.service_id).or_default().push(rate);
            }
            for (service_id, rates) in by_service {
                cache.rates.insert(service_id, Arc::new(rates)).await;
            }
        }
        Err(e) => warn!("Failed to warm rate cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
