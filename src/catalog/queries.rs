//! Database queries for suppliers, services and rates

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::pricing::models::{Rate, RateRow, ServiceCategory};
use crate::pricing::queries::{into_rates, RATE_COLUMNS};

use super::models::{
    CreateServiceRequest, CreateSupplierRequest, Service, Supplier, SupplierFilter,
    UpdateSupplierRequest,
};

const SUPPLIER_COLUMNS: &str =
    "id, name, kind, email, phone, city, notes, is_active, created_at, updated_at";

pub async fn insert_supplier(pool: &PgPool, req: &CreateSupplierRequest) -> Result<Supplier> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        r#"
        INSERT INTO suppliers (id, name, kind, email, phone, city, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {SUPPLIER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(req.name.trim())
    .bind(req.kind.trim())
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.city)
    .bind(&req.notes)
    .fetch_one(pool)
    .await?;

    Ok(supplier)
}

pub async fn get_supplier(pool: &PgPool, id: Uuid) -> Result<Option<Supplier>> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(supplier)
}

pub async fn list_suppliers(pool: &PgPool, filter: &SupplierFilter) -> Result<Vec<Supplier>> {
    let suppliers = sqlx::query_as::<_, Supplier>(&format!(
        r#"
        SELECT {SUPPLIER_COLUMNS}
        FROM suppliers
        WHERE ($1::text IS NULL OR city ILIKE $1)
          AND ($2::bool IS NULL OR is_active = $2)
        ORDER BY name
        "#
    ))
    .bind(&filter.city)
    .bind(filter.active)
    .fetch_all(pool)
    .await?;

    Ok(suppliers)
}

pub async fn update_supplier(
    pool: &PgPool,
    id: Uuid,
    req: &UpdateSupplierRequest,
) -> Result<Option<Supplier>> {
    let supplier = sqlx::query_as::<_, Supplier>(&format!(
        r#"
        UPDATE suppliers
        SET name = COALESCE($2, name),
            kind = COALESCE($3, kind),
            email = COALESCE($4, email),
            phone = COALESCE($5, phone),
            city = COALESCE($6, city),
            notes = COALESCE($7, notes),
            is_active = COALESCE($8, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {SUPPLIER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(req.kind.as_deref().map(str::trim))
    .bind(&req.email)
    .bind(&req.phone)
    .bind(&req.city)
    .bind(&req.notes)
    .bind(req.is_active)
    .fetch_optional(pool)
    .await?;

    Ok(supplier)
}

pub async fn insert_service(
    pool: &PgPool,
    supplier_id: Uuid,
    req: &CreateServiceRequest,
) -> Result<Service> {
    let service = sqlx::query_as::<_, Service>(
        r#"
        INSERT INTO services (id, supplier_id, category, name, city)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, supplier_id, category, name, city, is_active, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(supplier_id)
    .bind(req.category.as_str())
    .bind(req.name.trim())
    .bind(&req.city)
    .fetch_one(pool)
    .await?;

    Ok(service)
}

pub async fn get_service(pool: &PgPool, id: Uuid) -> Result<Option<Service>> {
    let service = sqlx::query_as::<_, Service>(
        r#"
        SELECT id, supplier_id, category, name, city, is_active, created_at
        FROM services
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(service)
}

pub async fn list_services(
    pool: &PgPool,
    supplier_id: Option<Uuid>,
    category: Option<ServiceCategory>,
) -> Result<Vec<Service>> {
    let services = sqlx::query_as::<_, Service>(
        r#"
        SELECT id, supplier_id, category, name, city, is_active, created_at
        FROM services
        WHERE ($1::uuid IS NULL OR supplier_id = $1)
          AND ($2::text IS NULL OR category = $2)
        ORDER BY name
        "#,
    )
    .bind(supplier_id)
    .bind(category.map(|c| c.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(services)
}

/// Lock a service row so concurrent rate writes for it serialize
pub async fn lock_service(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let locked: Option<Uuid> = sqlx::query_scalar("SELECT id FROM services WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(locked.is_some())
}

/// Every rate of a service, newest validity first
pub async fn list_rates(pool: &PgPool, service_id: Uuid) -> Result<Vec<Rate>> {
    let rows = sqlx::query_as::<_, RateRow>(&format!(
        r#"
        SELECT {RATE_COLUMNS}
        FROM rates
        WHERE service_id = $1
        ORDER BY valid_from DESC, created_at DESC
        "#
    ))
    .bind(service_id)
    .fetch_all(pool)
    .await?;

    into_rates(rows)
}

/// Active rates of a service, read inside a write transaction
pub async fn active_rates_for_service(conn: &mut PgConnection, service_id: Uuid) -> Result<Vec<Rate>> {
    let rows = sqlx::query_as::<_, RateRow>(&format!(
        "SELECT {RATE_COLUMNS} FROM rates WHERE service_id = $1 AND is_active = true"
    ))
    .bind(service_id)
    .fetch_all(&mut *conn)
    .await?;

    into_rates(rows)
}

pub async fn get_rate(conn: &mut PgConnection, id: Uuid) -> Result<Option<Rate>> {
    let row = sqlx::query_as::<_, RateRow>(&format!(
        "SELECT {RATE_COLUMNS} FROM rates WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(into_rates(row.into_iter().collect())?.pop())
}

pub async fn insert_rate(conn: &mut PgConnection, rate: &Rate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO rates (
            id, service_id, category, city, tier, basis,
            eur_rate, non_eur_rate, valid_from, valid_to,
            min_pax, max_pax, is_active, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        "#,
    )
    .bind(rate.id)
    .bind(rate.service_id)
    .bind(rate.category.as_str())
    .bind(&rate.city)
    .bind(&rate.tier)
    .bind(rate.basis.as_str())
    .bind(rate.eur_rate)
    .bind(rate.non_eur_rate)
    .bind(rate.valid_from)
    .bind(rate.valid_to)
    .bind(rate.min_pax)
    .bind(rate.max_pax)
    .bind(rate.is_active)
    .bind(rate.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_rate(conn: &mut PgConnection, rate: &Rate) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE rates
        SET basis = $2,
            eur_rate = $3,
            non_eur_rate = $4,
            valid_from = $5,
            valid_to = $6,
            is_active = $7
        WHERE id = $1
        "#,
    )
    .bind(rate.id)
    .bind(rate.basis.as_str())
    .bind(rate.eur_rate)
    .bind(rate.non_eur_rate)
    .bind(rate.valid_from)
    .bind(rate.valid_to)
    .bind(rate.is_active)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
