//! Rate selection.
//!
//! Picks the one applicable rate for a service on a given day. Candidates are
//! narrowed by active flag, validity window, pax band, city and tier. When
//! several survive, the most specific scope wins (city-scoped over city-less,
//! tiered over untiered). A tie at the most specific level is reported as
//! overlapping rates instead of being broken arbitrarily.

use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::{same_label, Rate};
use super::services::PricingError;

/// Context a rate must match
#[derive(Debug, Clone, Copy)]
pub struct RateScope<'a> {
    pub city: Option<&'a str>,
    pub tier: Option<&'a str>,
    pub date: NaiveDate,
    pub pax: i32,
}

/// Candidate rates grouped by service
#[derive(Debug, Clone, Default)]
pub struct RateBook {
    rates: HashMap<Uuid, Vec<Rate>>,
}

impl RateBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rate: Rate) {
        self.rates.entry(rate.service_id).or_default().push(rate);
    }

    /// Replace all candidates for one service
    pub fn set_service(&mut self, service_id: Uuid, rates: Vec<Rate>) {
        self.rates.insert(service_id, rates);
    }

    pub fn candidates(&self, service_id: Uuid) -> &[Rate] {
        self.rates
            .get(&service_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rates.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Rate> for RateBook {
    fn from_iter<I: IntoIterator<Item = Rate>>(iter: I) -> Self {
        let mut book = RateBook::new();
        for rate in iter {
            book.insert(rate);
        }
        book
    }
}

fn matches_scope(rate: &Rate, scope: &RateScope<'_>) -> bool {
    if !rate.is_active || !rate.is_valid_on(scope.date) || !rate.covers_pax(scope.pax) {
        return false;
    }

    let city_ok = match (rate.city.as_deref(), scope.city) {
        (None, _) => true,
        (Some(rate_city), Some(city)) => same_label(rate_city, city),
        (Some(_), None) => false,
    };

    let tier_ok = match (rate.tier.as_deref(), scope.tier) {
        (None, _) => true,
        (Some(rate_tier), Some(tier)) => same_label(rate_tier, tier),
        (Some(_), None) => false,
    };

    city_ok && tier_ok
}

fn specificity(rate: &Rate) -> u8 {
    (u8::from(rate.city.is_some()) << 1) | u8::from(rate.tier.is_some())
}

/// Select the applicable rate among a service's candidates.
///
/// Returns `Ok(None)` when nothing applies; the caller prices that slot at zero.
pub fn select_rate<'r>(
    candidates: &'r [Rate],
    scope: &RateScope<'_>,
) -> Result<Option<&'r Rate>, PricingError> {
    let applicable: Vec<&Rate> = candidates
        .iter()
        .filter(|rate| matches_scope(rate, scope))
        .collect();

    let Some(best) = applicable.iter().map(|rate| specificity(rate)).max() else {
        return Ok(None);
    };

    let winners: Vec<&Rate> = applicable
        .into_iter()
        .filter(|rate| specificity(rate) == best)
        .collect();

    match winners.as_slice() {
        [single] => Ok(Some(*single)),
        many => Err(PricingError::OverlappingRates {
            service_id: many[0].service_id.to_string(),
            date: scope.date.to_string(),
            rate_ids: many.iter().map(|rate| rate.id.to_string()).collect(),
        }),
    }
}

/// Every pair of active rates that would compete for the same day.
pub fn find_overlaps(rates: &[Rate]) -> Vec<(&Rate, &Rate)> {
    let mut pairs = Vec::new();
    for (i, a) in rates.iter().enumerate() {
        for b in &rates[i + 1..] {
            if a.conflicts_with(b) {
                pairs.push((a, b));
            }
        }
    }
    pairs
}
