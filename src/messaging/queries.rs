//! Database queries for WhatsApp messages

use sqlx::PgPool;

use crate::error::Result;

/// Store the latest delivery status of a message.
///
/// Returns false when no message has this SID.
pub async fn update_delivery_status(
    pool: &PgPool,
    message_sid: &str,
    status: &str,
    error_code: Option<&str>,
) -> Result<bool> {
    let updated = sqlx::query(
        r#"
        UPDATE whatsapp_messages
        SET status = $2,
            error_code = COALESCE($3, error_code),
            updated_at = NOW()
        WHERE message_sid = $1
        "#,
    )
    .bind(message_sid)
    .bind(status)
    .bind(error_code)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(updated > 0)
}
