//! Database queries for partners

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

use super::models::{CreatePartnerRequest, Partner, UpdatePartnerRequest};

pub async fn insert_partner(pool: &PgPool, req: &CreatePartnerRequest) -> Result<Partner> {
    let partner = sqlx::query_as::<_, Partner>(
        r#"
        INSERT INTO partners (id, name, email, markup_percent)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, email, markup_percent, is_active, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.name.trim())
    .bind(&req.email)
    .bind(req.markup_percent)
    .fetch_one(pool)
    .await?;

    Ok(partner)
}

pub async fn get_partner(pool: &PgPool, id: Uuid) -> Result<Option<Partner>> {
    let partner = sqlx::query_as::<_, Partner>(
        r#"
        SELECT id, name, email, markup_percent, is_active, created_at
        FROM partners
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(partner)
}

pub async fn list_partners(pool: &PgPool) -> Result<Vec<Partner>> {
    let partners = sqlx::query_as::<_, Partner>(
        r#"
        SELECT id, name, email, markup_percent, is_active, created_at
        FROM partners
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(partners)
}

pub async fn update_partner(
    pool: &PgPool,
    id: Uuid,
    req: &UpdatePartnerRequest,
) -> Result<Option<Partner>> {
    let partner = sqlx::query_as::<_, Partner>(
        r#"
        UPDATE partners
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            markup_percent = COALESCE($4, markup_percent),
            is_active = COALESCE($5, is_active)
        WHERE id = $1
        RETURNING id, name, email, markup_percent, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(req.name.as_deref().map(str::trim))
    .bind(&req.email)
    .bind(req.markup_percent)
    .bind(req.is_active)
    .fetch_optional(pool)
    .await?;

    Ok(partner)
}
