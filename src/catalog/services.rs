//! Rate writes.
//!
//! Each write locks the owning service row, re-reads its active rates and
//! refuses the change if two active rates would then cover the same day for
//! the same scope.

use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::pricing::models::{Rate, ServiceCategory};
use crate::pricing::queries as pricing_queries;
use crate::pricing::resolver::find_overlaps;
use crate::AppState;

use super::models::{check_rate, conflicting_rates, CreateRateRequest, RateOverlap, UpdateRateRequest};
use super::queries;

fn overlap_conflict(rate: &Rate, conflicts: &[&Rate]) -> AppError {
    let ids: Vec<String> = conflicts.iter().map(|r| r.id.to_string()).collect();
    AppError::Conflict(format!(
        "Rate validity {}..{} overlaps active rate(s) {} for the same scope",
        rate.valid_from,
        rate.valid_to.map_or_else(|| "open".to_string(), |d| d.to_string()),
        ids.join(", ")
    ))
}

/// Add a rate to a service
pub async fn create_rate(state: &AppState, service_id: Uuid, req: CreateRateRequest) -> Result<Rate> {
    let service = queries::get_service(&state.db, service_id)
        .await?
        .ok_or_else(|| AppError::not_found("Service"))?;
    let category: ServiceCategory = service
        .category
        .parse()
        .map_err(|e: String| AppError::Internal(format!("Service {}: {}", service.id, e)))?;

    let rate = req.into_rate(service.id, category);
    check_rate(&rate).map_err(AppError::Validation)?;

    let mut tx = state.db.begin().await?;
    if !queries::lock_service(&mut tx, service_id).await? {
        return Err(AppError::not_found("Service"));
    }
    let existing = queries::active_rates_for_service(&mut tx, service_id).await?;
    let conflicts = conflicting_rates(&rate, &existing);
    if !conflicts.is_empty() {
        return Err(overlap_conflict(&rate, &conflicts));
    }
    queries::insert_rate(&mut tx, &rate).await?;
    tx.commit().await?;

    state.cache.invalidate_rates(service_id).await;
    tracing::info!(rate_id = %rate.id, service_id = %service_id, "Rate created");
    Ok(rate)
}

/// Change a rate; deactivation is an update with `is_active = false`
pub async fn update_rate(state: &AppState, rate_id: Uuid, req: &UpdateRateRequest) -> Result<Rate> {
    let mut tx = state.db.begin().await?;

    let service_id = queries::get_rate(&mut tx, rate_id)
        .await?
        .ok_or_else(|| AppError::not_found("Rate"))?
        .service_id;
    queries::lock_service(&mut tx, service_id).await?;

    // Re-read under the service lock; another write may have landed in between
    let current = queries::get_rate(&mut tx, rate_id)
        .await?
        .ok_or_else(|| AppError::not_found("Rate"))?;

    let updated = req.apply_to(current);
    check_rate(&updated).map_err(AppError::Validation)?;

    if updated.is_active {
        let existing = queries::active_rates_for_service(&mut tx, updated.service_id).await?;
        let conflicts = conflicting_rates(&updated, &existing);
        if !conflicts.is_empty() {
            return Err(overlap_conflict(&updated, &conflicts));
        }
    }

    queries::update_rate(&mut tx, &updated).await?;
    tx.commit().await?;

    state.cache.invalidate_rates(updated.service_id).await;
    tracing::info!(rate_id = %rate_id, active = updated.is_active, "Rate updated");
    Ok(updated)
}

/// Every pair of active rates that would compete for the same day
pub async fn overlap_report(state: &AppState) -> Result<Vec<RateOverlap>> {
    let rates = pricing_queries::get_active_rates(&state.db).await?;

    let mut by_service: HashMap<Uuid, Vec<Rate>> = HashMap::new();
    for rate in rates {
        by_service.entry(rate.service_id).or_default().push(rate);
    }

    let mut report = Vec::new();
    for (service_id, rates) in &by_service {
        for (first, second) in find_overlaps(rates) {
            report.push(RateOverlap {
                service_id: *service_id,
                first: first.clone(),
                second: second.clone(),
            });
        }
    }

    if !report.is_empty() {
        tracing::warn!("{} overlapping rate pairs found", report.len());
    }
    Ok(report)
}
