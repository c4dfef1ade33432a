use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};

use super::new_id;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AcademyRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub founded_year: Option<i64>,
    pub is_verified: bool,
    pub created_at: i64,
}

const COLUMNS: &str = "id, name, description, country, state, city, address, phone, email, website, logo_url, founded_year, is_verified, created_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcademyFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub founded_year: Option<i64>,
    pub is_verified: Option<bool>,
}

pub async fn list(pool: &SqlitePool) -> anyhow::Result<Vec<AcademyRow>> {
    Ok(sqlx::query_as::<_, AcademyRow>(&format!(
        "SELECT {COLUMNS} FROM academies ORDER BY name"
    ))
    .fetch_all(pool)
    .await?)
}

pub async fn find(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<AcademyRow>> {
    Ok(sqlx::query_as::<_, AcademyRow>(&format!(
        "SELECT {COLUMNS} FROM academies WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?)
}

pub async fn exists(pool: &SqlitePool, id: &str) -> anyhow::Result<bool> {
    Ok(find(pool, id).await?.is_some())
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    country: &str,
    fields: &AcademyFields,
    now: i64,
) -> anyhow::Result<String> {
    let id = new_id();

    sqlx::query(
        r#"
        INSERT INTO academies (
            id, name, description, country, state, city, address, phone, email, website,
            logo_url, founded_year, is_verified, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name.trim())
    .bind(&fields.description)
    .bind(country.trim())
    .bind(&fields.state)
    .bind(&fields.city)
    .bind(&fields.address)
    .bind(&fields.phone)
    .bind(&fields.email)
    .bind(&fields.website)
    .bind(&fields.logo_url)
    .bind(fields.founded_year)
    .bind(fields.is_verified.unwrap_or(false))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn update(
    pool: &SqlitePool,
    id: &str,
    fields: &AcademyFields,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE academies SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            country = COALESCE(?, country),
            state = COALESCE(?, state),
            city = COALESCE(?, city),
            address = COALESCE(?, address),
            phone = COALESCE(?, phone),
            email = COALESCE(?, email),
            website = COALESCE(?, website),
            logo_url = COALESCE(?, logo_url),
            founded_year = COALESCE(?, founded_year),
            is_verified = COALESCE(?, is_verified),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.description)
    .bind(&fields.country)
    .bind(&fields.state)
    .bind(&fields.city)
    .bind(&fields.address)
    .bind(&fields.phone)
    .bind(&fields.email)
    .bind(&fields.website)
    .bind(&fields.logo_url)
    .bind(fields.founded_year)
    .bind(fields.is_verified)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Players and matches keep existing without their academy.
pub async fn delete(pool: &SqlitePool, id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM academies WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
