//! Rate models used by the pricing engine.
//!
//! `RateRow` is what sqlx reads from the `rates` table; `Rate` is the checked
//! form the calculator works with.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Service category a rate (and a day slot) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Accommodation,
    Guide,
    Transport,
    Entrance,
    Meal,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 5] = [
        ServiceCategory::Accommodation,
        ServiceCategory::Guide,
        ServiceCategory::Transport,
        ServiceCategory::Entrance,
        ServiceCategory::Meal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Accommodation => "accommodation",
            ServiceCategory::Guide => "guide",
            ServiceCategory::Transport => "transport",
            ServiceCategory::Entrance => "entrance",
            ServiceCategory::Meal => "meal",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown service category '{}'", s))
    }
}

/// Whether a rate is charged per traveller or once for the whole group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    /// Multiplied by pax (meals, entrances, shared guides)
    PerPerson,
    /// Flat for the group (private vehicle, private guide)
    PerGroup,
}

impl PriceBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceBasis::PerPerson => "per_person",
            PriceBasis::PerGroup => "per_group",
        }
    }
}

impl FromStr for PriceBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per_person" => Ok(PriceBasis::PerPerson),
            "per_group" => Ok(PriceBasis::PerGroup),
            other => Err(format!("unknown price basis '{}'", other)),
        }
    }
}

/// Which rate column a calculation reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateColumn {
    Eur,
    NonEur,
}

impl RateColumn {
    pub fn for_passport(is_euro_passport: bool) -> Self {
        if is_euro_passport {
            RateColumn::Eur
        } else {
            RateColumn::NonEur
        }
    }
}

/// Rate from the rates table
#[derive(Debug, Clone, FromRow)]
pub struct RateRow {
    pub id: Uuid,
    pub service_id: Uuid,
    pub category: String,
    pub city: Option<String>,
    pub tier: Option<String>,
    pub basis: String,
    pub eur_rate: Decimal,
    pub non_eur_rate: Decimal,
    pub valid_from: NaiveDate,
    pub valid_to: Option<NaiveDate>,
    pub min_pax: Option<i32>,
    pub max_pax: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A checked rate row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rate {
    pub id: Uuid,
    pub service_id: Uuid,
    pub category: ServiceCategory,
    pub city: Option<String>,
    pub tier: Option<String>,
    pub basis: PriceBasis,
    #[serde(with = "rust_decimal::serde::str")]
    pub eur_rate: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub non_eur_rate: Decimal,
    pub valid_from: NaiveDate,
    /// Inclusive end of validity, open-ended when absent
    pub valid_to: Option<NaiveDate>,
    pub min_pax: Option<i32>,
    pub max_pax: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<RateRow> for Rate {
    type Error = String;

    fn try_from(row: RateRow) -> Result<Self, Self::Error> {
        Ok(Rate {
            id: row.id,
            service_id: row.service_id,
            category: row.category.parse()?,
            city: row.city,
            tier: row.tier,
            basis: row.basis.parse()?,
            eur_rate: row.eur_rate,
            non_eur_rate: row.non_eur_rate,
            valid_from: row.valid_from,
            valid_to: row.valid_to,
            min_pax: row.min_pax,
            max_pax: row.max_pax,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

impl Rate {
    /// Amount in the requested column
    pub fn amount(&self, column: RateColumn) -> Decimal {
        match column {
            RateColumn::Eur => self.eur_rate,
            RateColumn::NonEur => self.non_eur_rate,
        }
    }

    /// Check if the rate is valid on the given day
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        if self.valid_from > date {
            return false;
        }
        match self.valid_to {
            Some(end) => date <= end,
            None => true,
        }
    }

    pub fn covers_pax(&self, pax: i32) -> bool {
        self.min_pax.map_or(true, |min| pax >= min) && self.max_pax.map_or(true, |max| pax <= max)
    }

    /// Whether two validity windows share at least one day
    pub fn validity_overlaps(&self, other: &Rate) -> bool {
        let starts_before_other_ends = other.valid_to.map_or(true, |end| self.valid_from <= end);
        let other_starts_before_end = self.valid_to.map_or(true, |end| other.valid_from <= end);
        starts_before_other_ends && other_starts_before_end
    }

    fn pax_band_overlaps(&self, other: &Rate) -> bool {
        let lo = self.min_pax.unwrap_or(i32::MIN).max(other.min_pax.unwrap_or(i32::MIN));
        let hi = self.max_pax.unwrap_or(i32::MAX).min(other.max_pax.unwrap_or(i32::MAX));
        lo <= hi
    }

    /// Same service, city and tier, with intersecting pax bands and dates.
    /// Two such active rows would both be candidates on some day.
    pub fn conflicts_with(&self, other: &Rate) -> bool {
        self.id != other.id
            && self.is_active
            && other.is_active
            && self.service_id == other.service_id
            && same_scope(self.city.as_deref(), other.city.as_deref())
            && same_scope(self.tier.as_deref(), other.tier.as_deref())
            && self.pax_band_overlaps(other)
            && self.validity_overlaps(other)
    }
}

/// City and tier labels compare trimmed and case-insensitive
pub fn same_label(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn same_scope(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => same_label(a, b),
        _ => false,
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::rate;
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_category_round_trips_through_str() {
        for category in ServiceCategory::ALL {
            assert_eq!(category.as_str().parse::<ServiceCategory>(), Ok(category));
        }
        assert!("spa".parse::<ServiceCategory>().is_err());
    }

    #[test]
    fn test_rate_validity_is_inclusive() {
        let mut r = rate(Uuid::new_v4(), ServiceCategory::Meal, PriceBasis::PerPerson, dec!(10), dec!(12));
        r.valid_to = Some(day(2025, 3, 31));

        assert!(!r.is_valid_on(day(2024, 12, 31)));
        assert!(r.is_valid_on(day(2025, 1, 1)));
        assert!(r.is_valid_on(day(2025, 3, 31)));
        assert!(!r.is_valid_on(day(2025, 4, 1)));
    }

    #[test]
    fn test_amount_reads_requested_column() {
        let r = rate(Uuid::new_v4(), ServiceCategory::Entrance, PriceBasis::PerPerson, dec!(20), dec!(35));
        assert_eq!(r.amount(RateColumn::Eur), dec!(20));
        assert_eq!(r.amount(RateColumn::NonEur), dec!(35));
        assert_eq!(RateColumn::for_passport(true), RateColumn::Eur);
        assert_eq!(RateColumn::for_passport(false), RateColumn::NonEur);
    }

    #[test]
    fn test_pax_band() {
        let mut r = rate(Uuid::new_v4(), ServiceCategory::Transport, PriceBasis::PerGroup, dec!(80), dec!(80));
        r.min_pax = Some(1);
        r.max_pax = Some(4);
        assert!(r.covers_pax(1));
        assert!(r.covers_pax(4));
        assert!(!r.covers_pax(5));
    }

    #[test]
    fn test_conflicts_with_same_scope_and_overlapping_dates() {
        let service = Uuid::new_v4();
        let mut a = rate(service, ServiceCategory::Guide, PriceBasis::PerGroup, dec!(50), dec!(60));
        a.valid_to = Some(day(2025, 6, 30));
        let mut b = rate(service, ServiceCategory::Guide, PriceBasis::PerGroup, dec!(55), dec!(65));
        b.valid_from = day(2025, 6, 30);

        assert!(a.conflicts_with(&b));
        assert!(b.conflicts_with(&a));

        b.valid_from = day(2025, 7, 1);
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_labels_differing_in_case_or_padding_conflict() {
        let service = Uuid::new_v4();
        let mut a = rate(service, ServiceCategory::Accommodation, PriceBasis::PerPerson, dec!(90), dec!(90));
        a.city = Some("Cairo".to_string());
        a.tier = Some("Deluxe".to_string());
        let mut b = a.clone();
        b.id = Uuid::new_v4();
        b.city = Some("cairo ".to_string());
        b.tier = Some("DELUXE".to_string());

        assert!(a.conflicts_with(&b));

        b.city = None;
        assert!(!a.conflicts_with(&b));
    }

    #[test]
    fn test_different_tier_or_pax_band_does_not_conflict() {
        let service = Uuid::new_v4();
        let a = rate(service, ServiceCategory::Accommodation, PriceBasis::PerPerson, dec!(90), dec!(90));
        let mut b = a.clone();
        b.id = Uuid::new_v4();
        b.tier = Some("deluxe".to_string());
        assert!(!a.conflicts_with(&b));

        let mut small = rate(service, ServiceCategory::Transport, PriceBasis::PerGroup, dec!(40), dec!(40));
        small.max_pax = Some(4);
        let mut large = small.clone();
        large.id = Uuid::new_v4();
        large.min_pax = Some(5);
        large.max_pax = None;
        assert!(!small.conflicts_with(&large));
    }

    #[test]
    fn test_inactive_rates_never_conflict() {
        let service = Uuid::new_v4();
        let a = rate(service, ServiceCategory::Meal, PriceBasis::PerPerson, dec!(10), dec!(10));
        let mut b = a.clone();
        b.id = Uuid::new_v4();
        b.is_active = false;
        assert!(!a.conflicts_with(&b));
    }
}
