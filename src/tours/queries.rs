//! Database queries for tours

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Tour, TourActivity, TourDay, TourSummary};

/// Tour header from the tours table
#[derive(Debug, Clone, FromRow)]
pub struct TourRow {
    pub id: Uuid,
    pub name: String,
    pub client_name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub tier: Option<String>,
    pub pax: i32,
    pub is_euro_passport: bool,
    pub margin_percent: Option<Decimal>,
    pub partner_id: Option<Uuid>,
    pub grand_total: Decimal,
    pub pricing_snapshot: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct TourDayRow {
    id: Uuid,
    day_number: i32,
    city: String,
    accommodation_id: Option<Uuid>,
    guide_id: Option<Uuid>,
    meal_ids: Vec<Uuid>,
    notes: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
struct TourActivityRow {
    day_id: Uuid,
    position: i32,
    name: String,
    entrance_id: Option<Uuid>,
    transport_id: Option<Uuid>,
}

/// Insert the tour header, days and activities.
///
/// Runs on the caller's connection so it can share a transaction.
pub async fn insert_tour(
    conn: &mut PgConnection,
    id: Uuid,
    tour: &Tour,
    grand_total: Decimal,
    snapshot: &serde_json::Value,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tours (
            id, name, client_name, start_date, tier, pax, is_euro_passport,
            margin_percent, partner_id, grand_total, pricing_snapshot
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(id)
    .bind(tour.name.trim())
    .bind(&tour.client_name)
    .bind(tour.start_date)
    .bind(&tour.tier)
    .bind(tour.pax)
    .bind(tour.is_euro_passport)
    .bind(tour.margin_percent)
    .bind(tour.partner_id)
    .bind(grand_total)
    .bind(snapshot)
    .execute(&mut *conn)
    .await?;

    insert_days(conn, id, &tour.days).await
}

/// Overwrite the tour header and replace all days.
///
/// Returns false when the tour does not exist.
pub async fn replace_tour(
    conn: &mut PgConnection,
    id: Uuid,
    tour: &Tour,
    grand_total: Decimal,
    snapshot: &serde_json::Value,
) -> Result<bool> {
    let updated = sqlx::query(
        r#"
        UPDATE tours
        SET name = $2,
            client_name = $3,
            start_date = $4,
            tier = $5,
            pax = $6,
            is_euro_passport = $7,
            margin_percent = $8,
            partner_id = $9,
            grand_total = $10,
            pricing_snapshot = $11,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(tour.name.trim())
    .bind(&tour.client_name)
    .bind(tour.start_date)
    .bind(&tour.tier)
    .bind(tour.pax)
    .bind(tour.is_euro_passport)
    .bind(tour.margin_percent)
    .bind(tour.partner_id)
    .bind(grand_total)
    .bind(snapshot)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    // Activities go with their days via ON DELETE CASCADE
    sqlx::query("DELETE FROM tour_days WHERE tour_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    insert_days(conn, id, &tour.days).await?;
    Ok(true)
}

/// Flatten days into the rows `insert_days` writes
fn day_rows(days: &[TourDay]) -> (Vec<TourDayRow>, Vec<TourActivityRow>) {
    let mut day_rows = Vec::with_capacity(days.len());
    let mut activity_rows = Vec::new();

    for day in days {
        let day_id = Uuid::new_v4();
        for (position, activity) in day.activities.iter().enumerate() {
            activity_rows.push(TourActivityRow {
                day_id,
                position: position as i32,
                name: activity.name.clone(),
                entrance_id: activity.entrance_id,
                transport_id: activity.transport_id,
            });
        }
        day_rows.push(TourDayRow {
            id: day_id,
            day_number: day.day_number,
            city: day.city.trim().to_string(),
            accommodation_id: day.accommodation_id,
            guide_id: day.guide_id,
            meal_ids: day.meal_ids.clone(),
            notes: day.notes.clone(),
        });
    }

    (day_rows, activity_rows)
}

async fn insert_days(conn: &mut PgConnection, tour_id: Uuid, days: &[TourDay]) -> Result<()> {
    let (days, activities) = day_rows(days);

    for day in &days {
        sqlx::query(
            r#"
            INSERT INTO tour_days (
                id, tour_id, day_number, city, accommodation_id, guide_id, meal_ids, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(day.id)
        .bind(tour_id)
        .bind(day.day_number)
        .bind(&day.city)
        .bind(day.accommodation_id)
        .bind(day.guide_id)
        .bind(&day.meal_ids)
        .bind(&day.notes)
        .execute(&mut *conn)
        .await?;
    }

    for activity in &activities {
        sqlx::query(
            r#"
            INSERT INTO tour_activities (id, day_id, position, name, entrance_id, transport_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(activity.day_id)
        .bind(activity.position)
        .bind(&activity.name)
        .bind(activity.entrance_id)
        .bind(activity.transport_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Load a tour header
pub async fn get_tour_row(pool: &PgPool, id: Uuid) -> Result<Option<TourRow>> {
    let row = sqlx::query_as::<_, TourRow>(
        r#"
        SELECT
            id, name, client_name, start_date, tier, pax, is_euro_passport,
            margin_percent, partner_id, grand_total, pricing_snapshot,
            created_at, updated_at
        FROM tours
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Load and reassemble the days of a tour
pub async fn get_tour_days(pool: &PgPool, tour_id: Uuid) -> Result<Vec<TourDay>> {
    let day_rows = sqlx::query_as::<_, TourDayRow>(
        r#"
        SELECT id, day_number, city, accommodation_id, guide_id, meal_ids, notes
        FROM tour_days
        WHERE tour_id = $1
        ORDER BY day_number
        "#,
    )
    .bind(tour_id)
    .fetch_all(pool)
    .await?;

    let day_ids: Vec<Uuid> = day_rows.iter().map(|d| d.id).collect();
    let activity_rows = sqlx::query_as::<_, TourActivityRow>(
        r#"
        SELECT day_id, position, name, entrance_id, transport_id
        FROM tour_activities
        WHERE day_id = ANY($1)
        ORDER BY day_id, position
        "#,
    )
    .bind(&day_ids)
    .fetch_all(pool)
    .await?;

    Ok(assemble_days(day_rows, activity_rows))
}

fn assemble_days(day_rows: Vec<TourDayRow>, mut activity_rows: Vec<TourActivityRow>) -> Vec<TourDay> {
    activity_rows.sort_by_key(|a| a.position);
    day_rows
        .into_iter()
        .map(|row| TourDay {
            activities: activity_rows
                .iter()
                .filter(|a| a.day_id == row.id)
                .map(|a| TourActivity {
                    name: a.name.clone(),
                    entrance_id: a.entrance_id,
                    transport_id: a.transport_id,
                })
                .collect(),
            day_number: row.day_number,
            city: row.city,
            accommodation_id: row.accommodation_id,
            guide_id: row.guide_id,
            meal_ids: row.meal_ids,
            notes: row.notes,
        })
        .collect()
}

/// List tours, newest first
pub async fn list_tours(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<TourSummary>> {
    let tours = sqlx::query_as::<_, TourSummary>(
        r#"
        SELECT id, name, client_name, pax, start_date, grand_total, created_at
        FROM tours
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(tours)
}

/// Delete a tour; days and activities cascade. Returns false when missing.
pub async fn delete_tour(pool: &PgPool, id: Uuid) -> Result<bool> {
    let deleted = sqlx::query("DELETE FROM tours WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_days_keeps_activities_with_their_day() {
        let d1 = Uuid::new_v4();
        let d2 = Uuid::new_v4();
        let entrance = Uuid::new_v4();
        let meal = Uuid::new_v4();

        let days = vec![
            TourDayRow {
                id: d1,
                day_number: 1,
                city: "Cairo".to_string(),
                accommodation_id: Some(Uuid::new_v4()),
                guide_id: None,
                meal_ids: vec![meal],
                notes: None,
            },
            TourDayRow {
                id: d2,
                day_number: 2,
                city: "Giza".to_string(),
                accommodation_id: None,
                guide_id: None,
                meal_ids: vec![],
                notes: Some("free day".to_string()),
            },
        ];
        let activities = vec![
            TourActivityRow {
                day_id: d2,
                position: 0,
                name: "Pyramids".to_string(),
                entrance_id: Some(entrance),
                transport_id: None,
            },
            TourActivityRow {
                day_id: d2,
                position: 1,
                name: "Sphinx".to_string(),
                entrance_id: None,
                transport_id: None,
            },
        ];

        let assembled = assemble_days(days, activities);
        assert_eq!(assembled.len(), 2);
        assert!(assembled[0].activities.is_empty());
        assert_eq!(assembled[0].meal_ids, vec![meal]);
        assert_eq!(assembled[1].activities.len(), 2);
        assert_eq!(assembled[1].activities[0].name, "Pyramids");
        assert_eq!(assembled[1].activities[0].entrance_id, Some(entrance));
        assert_eq!(assembled[1].notes.as_deref(), Some("free day"));
    }

    #[test]
    fn test_days_survive_write_and_read_back() {
        let activity = |name: &str| TourActivity {
            name: name.to_string(),
            entrance_id: Some(Uuid::new_v4()),
            transport_id: Some(Uuid::new_v4()),
        };
        let days = vec![
            TourDay {
                day_number: 1,
                city: "Cairo".to_string(),
                accommodation_id: Some(Uuid::new_v4()),
                guide_id: Some(Uuid::new_v4()),
                meal_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
                activities: vec![activity("Egyptian Museum"), activity("Khan el-Khalili")],
                notes: Some("arrival".to_string()),
            },
            TourDay {
                day_number: 2,
                city: "Luxor".to_string(),
                accommodation_id: None,
                guide_id: None,
                meal_ids: vec![],
                activities: vec![],
                notes: None,
            },
            TourDay {
                day_number: 3,
                city: "Aswan".to_string(),
                accommodation_id: Some(Uuid::new_v4()),
                guide_id: None,
                meal_ids: vec![Uuid::new_v4()],
                activities: vec![activity("Philae"), activity("High Dam"), activity("Felucca")],
                notes: None,
            },
        ];

        let (stored_days, mut stored_activities) = day_rows(&days);
        // Rows come back grouped by day, not in insertion order
        stored_activities.reverse();

        assert_eq!(assemble_days(stored_days, stored_activities), days);
    }
}
