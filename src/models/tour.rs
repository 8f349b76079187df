//! Tour structure shared by pricing and persistence.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tour as assembled in the itinerary builder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Quality level used to pick tiered rates (e.g. "standard", "deluxe")
    #[serde(default)]
    pub tier: Option<String>,
    pub pax: i32,
    #[serde(default)]
    pub is_euro_passport: bool,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub margin_percent: Option<Decimal>,
    #[serde(default)]
    pub partner_id: Option<Uuid>,
    #[serde(default)]
    pub days: Vec<TourDay>,
}

/// One day of a tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourDay {
    pub day_number: i32,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub accommodation_id: Option<Uuid>,
    #[serde(default)]
    pub guide_id: Option<Uuid>,
    #[serde(default)]
    pub meal_ids: Vec<Uuid>,
    #[serde(default)]
    pub activities: Vec<TourActivity>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A sightseeing stop or transfer within a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourActivity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entrance_id: Option<Uuid>,
    #[serde(default)]
    pub transport_id: Option<Uuid>,
}

impl Tour {
    /// Calendar date of a day, if the tour has a start date
    pub fn date_of(&self, day: &TourDay) -> Option<NaiveDate> {
        let offset = chrono::Days::new(u64::try_from(day.day_number - 1).ok()?);
        self.start_date?.checked_add_days(offset)
    }

    /// Every service referenced anywhere in the tour, deduplicated
    pub fn service_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .days
            .iter()
            .flat_map(|day| {
                day.accommodation_id
                    .into_iter()
                    .chain(day.guide_id)
                    .chain(day.meal_ids.iter().copied())
                    .chain(
                        day.activities
                            .iter()
                            .flat_map(|a| a.entrance_id.into_iter().chain(a.transport_id)),
                    )
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Row in the tour list
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TourSummary {
    pub id: Uuid,
    pub name: String,
    pub client_name: Option<String>,
    pub pax: i32,
    pub start_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::str")]
    pub grand_total: Decimal,
    pub created_at: DateTime<Utc>,
}
