use sea_query::{Alias, Expr, ExprTrait, Func, JoinType, LikeExpr, Order, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use serde::Serialize;
use sqlx::{SqlitePool, prelude::FromRow};
use unicorn_sport_access::Tier;
use unicorn_sport_db::table::{Subscriptions, Users};

use super::{like_pattern, new_id};
use crate::auth::Role;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<i64>,
    pub created_at: i64,
}

impl UserRow {
    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }
}

/// What clients get to see of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub email_verified: bool,
    pub is_active: bool,
    pub last_login_at: Option<i64>,
    pub created_at: i64,
}

impl From<&UserRow> for UserView {
    fn from(row: &UserRow) -> Self {
        Self {
            id: row.id.clone(),
            email: row.email.clone(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            role: row.role(),
            email_verified: row.email_verified,
            is_active: row.is_active,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, email_verified, is_active, last_login_at, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<UserRow>> {
    Ok(
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> anyhow::Result<Option<UserRow>> {
    Ok(sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?)
}

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
}

/// Inserts the user together with a free subscription row.
pub async fn create(pool: &SqlitePool, new: NewUser<'_>, now: i64) -> anyhow::Result<UserRow> {
    let id = new_id();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, first_name, last_name, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.email.trim().to_lowercase())
    .bind(new.password_hash)
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(new.role.to_string())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO subscriptions (id, user_id, tier, status, created_at, updated_at)
        VALUES (?, ?, 'free', 'active', ?, ?)
        "#,
    )
    .bind(new_id())
    .bind(&id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {id} vanished after insert"))
}

pub async fn record_login(pool: &SqlitePool, id: &str, now: i64) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET last_login_at = ?, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_password(
    pool: &SqlitePool,
    id: &str,
    password_hash: &str,
    now: i64,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_access(
    pool: &SqlitePool,
    id: &str,
    is_active: Option<bool>,
    role: Option<Role>,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET is_active = COALESCE(?, is_active), role = COALESCE(?, role), updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(is_active)
    .bind(role.map(|role| role.to_string()))
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn store_refresh_token(
    pool: &SqlitePool,
    user_id: &str,
    token_hash: &str,
    expires_at: i64,
    now: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(new_id())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deletes the token and returns its owner when it was still valid.
pub async fn take_refresh_token(
    pool: &SqlitePool,
    token_hash: &str,
    now: i64,
) -> anyhow::Result<Option<String>> {
    let row = sqlx::query_as::<_, (String, i64)>(
        "DELETE FROM refresh_tokens WHERE token_hash = ? RETURNING user_id, expires_at",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|(user_id, expires_at)| (expires_at > now).then_some(user_id)))
}

pub async fn revoke_refresh_tokens(pool: &SqlitePool, user_id: &str) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM refresh_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn store_reset_token(
    pool: &SqlitePool,
    user_id: &str,
    token_hash: &str,
    expires_at: i64,
    now: i64,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(new_id())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Marks an unused, unexpired reset token as used and returns its owner.
pub async fn consume_reset_token(
    pool: &SqlitePool,
    token_hash: &str,
    now: i64,
) -> anyhow::Result<Option<String>> {
    Ok(sqlx::query_scalar::<_, String>(
        r#"
        UPDATE password_reset_tokens SET used_at = ?
        WHERE token_hash = ? AND used_at IS NULL AND expires_at > ?
        RETURNING user_id
        "#,
    )
    .bind(now)
    .bind(token_hash)
    .bind(now)
    .fetch_optional(pool)
    .await?)
}

/// Wrong guesses a code survives before it stops matching.
pub const MAX_CODE_ATTEMPTS: i64 = 5;

/// Replaces any unused code of the user with a new one.
pub async fn store_verification_code(
    pool: &SqlitePool,
    user_id: &str,
    code_hash: &str,
    expires_at: i64,
    now: i64,
) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM email_verification_codes WHERE user_id = ? AND used_at IS NULL")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO email_verification_codes (id, user_id, code_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(new_id())
    .bind(user_id)
    .bind(code_hash)
    .bind(expires_at)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}

/// Uses the user's live code when it matches and marks the email verified.
///
/// A miss counts against the live code. Returns whether the email is now
/// verified.
pub async fn verify_email(
    pool: &SqlitePool,
    user_id: &str,
    code_hash: &str,
    now: i64,
) -> anyhow::Result<bool> {
    let mut tx = pool.begin().await?;

    let used = sqlx::query(
        r#"
        UPDATE email_verification_codes SET used_at = ?
        WHERE user_id = ? AND code_hash = ? AND used_at IS NULL
          AND expires_at > ? AND attempts < ?
        "#,
    )
    .bind(now)
    .bind(user_id)
    .bind(code_hash)
    .bind(now)
    .bind(MAX_CODE_ATTEMPTS)
    .execute(&mut *tx)
    .await?
    .rows_affected()
        > 0;

    if used {
        sqlx::query("UPDATE users SET email_verified = 1, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query(
            "UPDATE email_verification_codes SET attempts = attempts + 1 WHERE user_id = ? AND used_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(used)
}

#[derive(Debug, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub tier: Option<Tier>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminUserRow {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_active: bool,
    pub last_login_at: Option<i64>,
    pub created_at: i64,
    pub subscription_tier: Option<String>,
    pub subscription_status: Option<String>,
}

pub async fn list_admin(
    pool: &SqlitePool,
    filter: &UserFilter,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<AdminUserRow>, i64)> {
    let mut base = Query::select()
        .from(Users::Table)
        .join(
            JoinType::LeftJoin,
            Subscriptions::Table,
            Expr::col((Subscriptions::Table, Subscriptions::UserId)).equals((Users::Table, Users::Id)),
        )
        .to_owned();

    if let Some(role) = filter.role {
        base.and_where(Expr::col((Users::Table, Users::Role)).eq(role.to_string()));
    }

    if let Some(tier) = filter.tier {
        base.and_where(
            Expr::expr(Func::coalesce([
                Expr::col((Subscriptions::Table, Subscriptions::Tier)),
                Expr::val("free"),
            ]))
            .eq(tier.to_string()),
        );
    }

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        base.cond_where(
            sea_query::Cond::any()
                .add(
                    Expr::col((Users::Table, Users::Email))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::col((Users::Table, Users::FirstName))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::col((Users::Table, Users::LastName))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    let (sql, values) = base
        .clone()
        .expr(Func::count(Expr::col((Users::Table, Users::Id))))
        .build_sqlx(SqliteQueryBuilder);
    let (total,) = sqlx::query_as_with::<_, (i64,), _>(&sql, values)
        .fetch_one(pool)
        .await?;

    let (sql, values) = base
        .columns([
            (Users::Table, Users::Id),
            (Users::Table, Users::Email),
            (Users::Table, Users::FirstName),
            (Users::Table, Users::LastName),
            (Users::Table, Users::Role),
            (Users::Table, Users::IsActive),
            (Users::Table, Users::LastLoginAt),
            (Users::Table, Users::CreatedAt),
        ])
        .expr_as(
            Expr::col((Subscriptions::Table, Subscriptions::Tier)),
            Alias::new("subscription_tier"),
        )
        .expr_as(
            Expr::col((Subscriptions::Table, Subscriptions::Status)),
            Alias::new("subscription_status"),
        )
        .order_by((Users::Table, Users::CreatedAt), Order::Desc)
        .limit(limit)
        .offset(offset)
        .build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, AdminUserRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

pub async fn count_since(pool: &SqlitePool, since: Option<i64>) -> anyhow::Result<i64> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE (? IS NULL OR created_at >= ?)")
            .bind(since)
            .bind(since)
            .fetch_one(pool)
            .await?,
    )
}
