use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};
use strum::{AsRefStr, Display, EnumString};

use super::new_id;

/// Days before staff follow up on an unanswered request.
const FOLLOW_UP_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ContactRequestRow {
    pub id: String,
    pub user_id: String,
    pub player_id: String,
    pub player_first_name: String,
    pub player_last_name: String,
    pub message: String,
    pub status: String,
    pub follow_up_at: Option<i64>,
    pub created_at: i64,
}

const SELECT: &str = r#"
    SELECT c.id, c.user_id, c.player_id, p.first_name AS player_first_name,
           p.last_name AS player_last_name, c.message, c.status, c.follow_up_at, c.created_at
    FROM contact_requests c
    JOIN players p ON p.id = c.player_id
"#;

/// Returns `None` when the scout already has a pending request for the player.
pub async fn create(
    pool: &SqlitePool,
    user_id: &str,
    player_id: &str,
    message: &str,
    now: i64,
) -> anyhow::Result<Option<String>> {
    let id = new_id();

    let result = sqlx::query(
        r#"
        INSERT INTO contact_requests (id, user_id, player_id, message, status, follow_up_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, 'pending', ?, ?, ?)
        ON CONFLICT (user_id, player_id) WHERE status = 'pending' DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(player_id)
    .bind(message.trim())
    .bind(now + FOLLOW_UP_SECS)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok((result.rows_affected() > 0).then_some(id))
}

pub async fn find(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<ContactRequestRow>> {
    Ok(
        sqlx::query_as::<_, ContactRequestRow>(&format!("{SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: &str,
) -> anyhow::Result<Vec<ContactRequestRow>> {
    Ok(sqlx::query_as::<_, ContactRequestRow>(&format!(
        "{SELECT} WHERE c.user_id = ? ORDER BY c.created_at DESC, c.id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn list_admin(
    pool: &SqlitePool,
    status: Option<ContactStatus>,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<ContactRequestRow>, i64)> {
    let status = status.map(|status| status.to_string());

    let total = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM contact_requests WHERE (? IS NULL OR status = ?)",
    )
    .bind(&status)
    .bind(&status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, ContactRequestRow>(&format!(
        "{SELECT} WHERE (? IS NULL OR c.status = ?) ORDER BY c.created_at DESC, c.id LIMIT ? OFFSET ?"
    ))
    .bind(&status)
    .bind(&status)
    .bind(limit as i64)
    .bind(offset as i64)
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn set_status(
    pool: &SqlitePool,
    id: &str,
    status: ContactStatus,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query("UPDATE contact_requests SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.to_string())
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_pending(pool: &SqlitePool) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM contact_requests WHERE status = 'pending'")
            .fetch_one(pool)
            .await?,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InquiryType {
    #[default]
    General,
    Partnership,
    Media,
    Support,
}

/// Public contact-form messages sent from `email` since `since`.
pub async fn count_recent_inquiries(
    pool: &SqlitePool,
    email: &str,
    since: i64,
) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM general_contact_requests WHERE email = ? AND created_at >= ?",
    )
    .bind(email.trim().to_lowercase())
    .bind(since)
    .fetch_one(pool)
    .await?)
}

pub async fn create_inquiry(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    message: &str,
    inquiry_type: InquiryType,
    now: i64,
) -> anyhow::Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO general_contact_requests (id, name, email, message, request_type, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name.trim())
    .bind(email.trim().to_lowercase())
    .bind(message.trim())
    .bind(inquiry_type.to_string())
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}
