use chrono::{Datelike, NaiveDate};
use sea_query::{
    Cond, Expr, ExprTrait, Func, LikeExpr, Order, Query, SelectStatement, SqliteQueryBuilder,
};
use sea_query_sqlx::SqlxBinder;
use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, prelude::FromRow};
use strum::{AsRefStr, Display, EnumString};
use unicorn_sport_db::table::{MatchPlayers, Matches, Players};

use super::{like_pattern, new_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PlayerRow {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub position: String,
    pub preferred_foot: Option<String>,
    pub height_cm: Option<i64>,
    pub weight_kg: Option<i64>,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub bio: Option<String>,
    pub verification_status: String,
    pub profile_photo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tournament_id: Option<String>,
    pub academy_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PlayerRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "Smith" becomes "S."
    pub fn last_name_initial(&self) -> String {
        self.last_name
            .chars()
            .next()
            .map(|c| format!("{}.", c.to_uppercase()))
            .unwrap_or_default()
    }

    pub fn age(&self, today: NaiveDate) -> Option<i32> {
        age_on(&self.date_of_birth, today)
    }
}

/// Whole years between a `YYYY-MM-DD` birth date and `today`.
pub fn age_on(date_of_birth: &str, today: NaiveDate) -> Option<i32> {
    let born = NaiveDate::parse_from_str(date_of_birth, "%Y-%m-%d").ok()?;
    let mut age = today.year() - born.year();

    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }

    Some(age)
}

/// Oldest age the search filters reason about.
pub const MAX_SEARCH_AGE: i32 = 100;

/// Latest birth date for someone at least `years` old on `today`.
///
/// `years` is clamped to `0..=MAX_SEARCH_AGE + 1`.
fn born_on_or_before(today: NaiveDate, years: i32) -> String {
    let year = today.year() - years.clamp(0, MAX_SEARCH_AGE + 1);
    let date = NaiveDate::from_ymd_opt(year, today.month(), today.day())
        // 29 February in a non-leap year
        .or_else(|| NaiveDate::from_ymd_opt(year, today.month(), 28))
        .unwrap_or(today);

    date.format("%Y-%m-%d").to_string()
}

const COLUMNS: [Players; 20] = [
    Players::Id,
    Players::FirstName,
    Players::LastName,
    Players::DateOfBirth,
    Players::Position,
    Players::PreferredFoot,
    Players::HeightCm,
    Players::WeightKg,
    Players::Country,
    Players::State,
    Players::City,
    Players::School,
    Players::Bio,
    Players::VerificationStatus,
    Players::ProfilePhotoUrl,
    Players::ThumbnailUrl,
    Players::TournamentId,
    Players::AcademyId,
    Players::CreatedAt,
    Players::UpdatedAt,
];

fn select_players() -> SelectStatement {
    Query::select()
        .columns(COLUMNS.map(|column| (Players::Table, column)))
        .from(Players::Table)
        .and_where(Expr::col((Players::Table, Players::DeletedAt)).is_null())
        .to_owned()
}

fn public_condition() -> Cond {
    Cond::all()
        .add(
            Expr::col((Players::Table, Players::VerificationStatus))
                .eq(VerificationStatus::Verified.to_string()),
        )
        .add(Expr::col((Players::Table, Players::DeletedAt)).is_null())
}

async fn fetch_page(
    pool: &SqlitePool,
    statement: SelectStatement,
    order: &[(Players, Order)],
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<PlayerRow>, i64)> {
    let mut count = statement.clone();
    count.clear_selects();
    let (sql, values) = count
        .expr(Func::count(Expr::col((Players::Table, Players::Id))))
        .build_sqlx(SqliteQueryBuilder);
    let (total,) = sqlx::query_as_with::<_, (i64,), _>(&sql, values)
        .fetch_one(pool)
        .await?;

    let mut statement = statement;
    for (column, order) in order {
        statement.order_by((Players::Table, *column), order.clone());
    }
    let (sql, values) = statement
        .order_by((Players::Table, Players::Id), Order::Asc)
        .limit(limit)
        .offset(offset)
        .build_sqlx(SqliteQueryBuilder);

    let rows = sqlx::query_as_with::<_, PlayerRow, _>(&sql, values)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

async fn fetch_one(pool: &SqlitePool, statement: SelectStatement) -> anyhow::Result<Option<PlayerRow>> {
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    Ok(sqlx::query_as_with::<_, PlayerRow, _>(&sql, values)
        .fetch_optional(pool)
        .await?)
}

/// Verified and not deleted.
pub async fn find_public(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<PlayerRow>> {
    let statement = select_players()
        .cond_where(public_condition())
        .and_where(Expr::col((Players::Table, Players::Id)).eq(id))
        .to_owned();

    fetch_one(pool, statement).await
}

/// Any status, not deleted.
pub async fn find(pool: &SqlitePool, id: &str) -> anyhow::Result<Option<PlayerRow>> {
    let statement = select_players()
        .and_where(Expr::col((Players::Table, Players::Id)).eq(id))
        .to_owned();

    fetch_one(pool, statement).await
}

pub async fn list_public(
    pool: &SqlitePool,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<PlayerRow>, i64)> {
    let statement = select_players().cond_where(public_condition()).to_owned();

    fetch_page(
        pool,
        statement,
        &[(Players::CreatedAt, Order::Desc)],
        limit,
        offset,
    )
    .await
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeaturedPlayer {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub player: PlayerRow,
    pub highlight_count: i64,
}

/// Verified players with the most approved highlights.
pub async fn featured(pool: &SqlitePool, limit: u32) -> anyhow::Result<Vec<FeaturedPlayer>> {
    Ok(sqlx::query_as::<_, FeaturedPlayer>(
        r#"
        SELECT p.id, p.first_name, p.last_name, p.date_of_birth, p.position, p.preferred_foot,
               p.height_cm, p.weight_kg, p.country, p.state, p.city, p.school, p.bio,
               p.verification_status, p.profile_photo_url, p.thumbnail_url, p.tournament_id,
               p.academy_id, p.created_at, p.updated_at,
               (SELECT COUNT(*) FROM player_highlights h
                WHERE h.player_id = p.id AND h.status = 'approved') AS highlight_count
        FROM players p
        WHERE p.verification_status = 'verified' AND p.deleted_at IS NULL
        ORDER BY highlight_count DESC, p.created_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortBy {
    #[default]
    CreatedAt,
    FirstName,
    Position,
    Country,
    DateOfBirth,
}

impl SortBy {
    /// Unknown columns fall back to `created_at`.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|raw| raw.parse().ok()).unwrap_or_default()
    }

    fn column(self) -> Players {
        match self {
            SortBy::CreatedAt => Players::CreatedAt,
            SortBy::FirstName => Players::FirstName,
            SortBy::Position => Players::Position,
            SortBy::Country => Players::Country,
            SortBy::DateOfBirth => Players::DateOfBirth,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PlayerSearch {
    pub q: Option<String>,
    pub position: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub preferred_foot: Option<String>,
    pub age_min: Option<i32>,
    pub age_max: Option<i32>,
    pub height_min: Option<i64>,
    pub height_max: Option<i64>,
    pub tournament_id: Option<String>,
    pub sort_by: SortBy,
    pub descending: bool,
}

impl PlayerSearch {
    /// Filters beyond text, position and location.
    pub fn uses_advanced_filters(&self) -> bool {
        self.preferred_foot.is_some()
            || self.age_min.is_some()
            || self.age_max.is_some()
            || self.height_min.is_some()
            || self.height_max.is_some()
            || self.tournament_id.is_some()
    }

    fn condition(&self, today: NaiveDate) -> Cond {
        let mut cond = public_condition();

        if let Some(q) = self.q.as_deref().filter(|q| !q.trim().is_empty()) {
            let pattern = like_pattern(q);
            let mut any = Cond::any();
            for column in [
                Players::FirstName,
                Players::LastName,
                Players::Position,
                Players::Country,
                Players::School,
            ] {
                any = any.add(
                    Expr::col((Players::Table, column))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                );
            }
            cond = cond.add(any);
        }

        if let Some(position) = &self.position {
            cond = cond.add(Expr::col((Players::Table, Players::Position)).eq(position.as_str()));
        }
        if let Some(country) = &self.country {
            cond = cond.add(Expr::col((Players::Table, Players::Country)).eq(country.as_str()));
        }
        if let Some(state) = &self.state {
            cond = cond.add(Expr::col((Players::Table, Players::State)).eq(state.as_str()));
        }
        if let Some(foot) = &self.preferred_foot {
            cond = cond.add(Expr::col((Players::Table, Players::PreferredFoot)).eq(foot.as_str()));
        }
        if let Some(age_min) = self.age_min {
            cond = cond.add(
                Expr::col((Players::Table, Players::DateOfBirth))
                    .lte(born_on_or_before(today, age_min)),
            );
        }
        if let Some(age_max) = self.age_max {
            cond = cond.add(
                Expr::col((Players::Table, Players::DateOfBirth))
                    .gt(born_on_or_before(today, age_max.saturating_add(1))),
            );
        }
        if let Some(height_min) = self.height_min {
            cond = cond.add(Expr::col((Players::Table, Players::HeightCm)).gte(height_min));
        }
        if let Some(height_max) = self.height_max {
            cond = cond.add(Expr::col((Players::Table, Players::HeightCm)).lte(height_max));
        }
        if let Some(tournament_id) = &self.tournament_id {
            let appeared = Query::select()
                .column((MatchPlayers::Table, MatchPlayers::PlayerId))
                .from(MatchPlayers::Table)
                .inner_join(
                    Matches::Table,
                    Expr::col((Matches::Table, Matches::Id))
                        .equals((MatchPlayers::Table, MatchPlayers::MatchId)),
                )
                .and_where(
                    Expr::col((Matches::Table, Matches::TournamentId)).eq(tournament_id.as_str()),
                )
                .to_owned();

            cond = cond.add(
                Cond::any()
                    .add(
                        Expr::col((Players::Table, Players::TournamentId))
                            .eq(tournament_id.as_str()),
                    )
                    .add(Expr::col((Players::Table, Players::Id)).in_subquery(appeared)),
            );
        }

        cond
    }
}

pub async fn search(
    pool: &SqlitePool,
    search: &PlayerSearch,
    today: NaiveDate,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<PlayerRow>, i64)> {
    let statement = select_players().cond_where(search.condition(today)).to_owned();
    let order = if search.descending {
        Order::Desc
    } else {
        Order::Asc
    };

    fetch_page(
        pool,
        statement,
        &[(search.sort_by.column(), order)],
        limit,
        offset,
    )
    .await
}

#[derive(Debug, Clone, Serialize)]
pub struct AgeRange {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub positions: Vec<String>,
    pub countries: Vec<String>,
    pub states: Vec<String>,
    pub preferred_feet: Vec<String>,
    pub age_range: AgeRange,
}

async fn distinct(pool: &SqlitePool, column: &str) -> anyhow::Result<Vec<String>> {
    // column names come from the fixed list in `filter_options`
    Ok(sqlx::query_scalar::<_, String>(&format!(
        r#"
        SELECT DISTINCT {column} FROM players
        WHERE verification_status = 'verified' AND deleted_at IS NULL AND {column} IS NOT NULL
        ORDER BY {column}
        "#
    ))
    .fetch_all(pool)
    .await?)
}

pub async fn filter_options(pool: &SqlitePool, today: NaiveDate) -> anyhow::Result<FilterOptions> {
    let (youngest, oldest) = sqlx::query_as::<_, (Option<String>, Option<String>)>(
        r#"
        SELECT MAX(date_of_birth), MIN(date_of_birth) FROM players
        WHERE verification_status = 'verified' AND deleted_at IS NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(FilterOptions {
        positions: distinct(pool, "position").await?,
        countries: distinct(pool, "country").await?,
        states: distinct(pool, "state").await?,
        preferred_feet: distinct(pool, "preferred_foot").await?,
        age_range: AgeRange {
            min: youngest.and_then(|dob| age_on(&dob, today)),
            max: oldest.and_then(|dob| age_on(&dob, today)),
        },
    })
}

#[derive(Debug, Default)]
pub struct AdminPlayerFilter {
    pub search: Option<String>,
    pub status: Option<VerificationStatus>,
}

pub async fn list_admin(
    pool: &SqlitePool,
    filter: &AdminPlayerFilter,
    limit: u64,
    offset: u64,
) -> anyhow::Result<(Vec<PlayerRow>, i64)> {
    let mut statement = select_players();

    if let Some(status) = filter.status {
        statement.and_where(
            Expr::col((Players::Table, Players::VerificationStatus)).eq(status.to_string()),
        );
    }

    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        statement.cond_where(
            Cond::any()
                .add(
                    Expr::col((Players::Table, Players::FirstName))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::col((Players::Table, Players::LastName))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    fetch_page(
        pool,
        statement,
        &[(Players::CreatedAt, Order::Desc)],
        limit,
        offset,
    )
    .await
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub position: Option<String>,
    pub preferred_foot: Option<String>,
    pub height_cm: Option<i64>,
    pub weight_kg: Option<i64>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub school: Option<String>,
    pub bio: Option<String>,
    pub profile_photo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tournament_id: Option<String>,
    pub academy_id: Option<String>,
    pub verification_status: Option<VerificationStatus>,
}

pub struct NewPlayer<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: &'a str,
    pub position: &'a str,
    pub country: &'a str,
    pub fields: &'a PlayerFields,
    pub created_by: &'a str,
}

pub async fn create(pool: &SqlitePool, new: NewPlayer<'_>, now: i64) -> anyhow::Result<String> {
    let id = new_id();
    let fields = new.fields;

    sqlx::query(
        r#"
        INSERT INTO players (
            id, first_name, last_name, date_of_birth, position, preferred_foot, height_cm,
            weight_kg, country, state, city, school, bio, verification_status,
            profile_photo_url, thumbnail_url, tournament_id, academy_id, created_by,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.first_name.trim())
    .bind(new.last_name.trim())
    .bind(new.date_of_birth)
    .bind(new.position.trim())
    .bind(&fields.preferred_foot)
    .bind(fields.height_cm)
    .bind(fields.weight_kg)
    .bind(new.country.trim())
    .bind(&fields.state)
    .bind(&fields.city)
    .bind(&fields.school)
    .bind(&fields.bio)
    .bind(fields.verification_status.unwrap_or_default().to_string())
    .bind(&fields.profile_photo_url)
    .bind(&fields.thumbnail_url)
    .bind(&fields.tournament_id)
    .bind(&fields.academy_id)
    .bind(new.created_by)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Partial update; `None` leaves a column untouched.
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    fields: &PlayerFields,
    now: i64,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE players SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            date_of_birth = COALESCE(?, date_of_birth),
            position = COALESCE(?, position),
            preferred_foot = COALESCE(?, preferred_foot),
            height_cm = COALESCE(?, height_cm),
            weight_kg = COALESCE(?, weight_kg),
            country = COALESCE(?, country),
            state = COALESCE(?, state),
            city = COALESCE(?, city),
            school = COALESCE(?, school),
            bio = COALESCE(?, bio),
            profile_photo_url = COALESCE(?, profile_photo_url),
            thumbnail_url = COALESCE(?, thumbnail_url),
            tournament_id = COALESCE(?, tournament_id),
            academy_id = COALESCE(?, academy_id),
            verification_status = COALESCE(?, verification_status),
            updated_at = ?
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(&fields.first_name)
    .bind(&fields.last_name)
    .bind(&fields.date_of_birth)
    .bind(&fields.position)
    .bind(&fields.preferred_foot)
    .bind(fields.height_cm)
    .bind(fields.weight_kg)
    .bind(&fields.country)
    .bind(&fields.state)
    .bind(&fields.city)
    .bind(&fields.school)
    .bind(&fields.bio)
    .bind(&fields.profile_photo_url)
    .bind(&fields.thumbnail_url)
    .bind(&fields.tournament_id)
    .bind(&fields.academy_id)
    .bind(fields.verification_status.map(|status| status.to_string()))
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_verification(
    pool: &SqlitePool,
    ids: &[String],
    status: VerificationStatus,
    now: i64,
) -> anyhow::Result<u64> {
    let statement = Query::update()
        .table(Players::Table)
        .values([
            (Players::VerificationStatus, status.to_string().into()),
            (Players::UpdatedAt, now.into()),
        ])
        .and_where(Expr::col(Players::Id).is_in(ids.iter().map(String::as_str)))
        .and_where(Expr::col(Players::DeletedAt).is_null())
        .to_owned();
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    Ok(sqlx::query_with(&sql, values)
        .execute(pool)
        .await?
        .rows_affected())
}

pub async fn soft_delete(pool: &SqlitePool, ids: &[String], now: i64) -> anyhow::Result<u64> {
    let statement = Query::update()
        .table(Players::Table)
        .values([(Players::DeletedAt, now.into()), (Players::UpdatedAt, now.into())])
        .and_where(Expr::col(Players::Id).is_in(ids.iter().map(String::as_str)))
        .and_where(Expr::col(Players::DeletedAt).is_null())
        .to_owned();
    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);

    Ok(sqlx::query_with(&sql, values)
        .execute(pool)
        .await?
        .rows_affected())
}

pub async fn count_public(pool: &SqlitePool) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM players WHERE verification_status = 'verified' AND deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await?)
}

pub async fn count_countries(pool: &SqlitePool) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(DISTINCT country) FROM players WHERE verification_status = 'verified' AND deleted_at IS NULL",
    )
    .fetch_one(pool)
    .await?)
}

pub async fn count_since(pool: &SqlitePool, since: Option<i64>) -> anyhow::Result<i64> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM players WHERE deleted_at IS NULL AND (? IS NULL OR created_at >= ?)",
    )
    .bind(since)
    .bind(since)
    .fetch_one(pool)
    .await?)
}
