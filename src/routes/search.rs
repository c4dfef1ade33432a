use axum::{extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use unicorn_sport_access::Capability;
use validator::Validate;

use super::{AppState, players::PlayerCard, require};
use crate::{
    auth::MaybeAuthUser,
    error::AppError,
    query::{
        self,
        player::{PlayerSearch, SortBy},
    },
    response::{Page, PageParams, QueryParams, ok},
};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SearchParams {
    pub q: Option<String>,
    pub position: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub preferred_foot: Option<String>,
    #[validate(range(min = 0, max = 100, message = "Age must be between 0 and 100"))]
    pub age_min: Option<i32>,
    #[validate(range(min = 0, max = 100, message = "Age must be between 0 and 100"))]
    pub age_max: Option<i32>,
    #[validate(range(min = 0, max = 300))]
    pub height_min: Option<i64>,
    #[validate(range(min = 0, max = 300))]
    pub height_max: Option<i64>,
    pub tournament_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchParams {
    fn into_search(self) -> (PlayerSearch, PageParams) {
        let descending = match self.sort_order.as_deref() {
            Some(order) => order.eq_ignore_ascii_case("desc"),
            None => true,
        };
        let blank_to_none =
            |value: Option<String>| value.filter(|value| !value.trim().is_empty());

        let search = PlayerSearch {
            q: blank_to_none(self.q),
            position: blank_to_none(self.position),
            country: blank_to_none(self.country),
            state: blank_to_none(self.state),
            preferred_foot: blank_to_none(self.preferred_foot),
            age_min: self.age_min,
            age_max: self.age_max,
            height_min: self.height_min,
            height_max: self.height_max,
            tournament_id: blank_to_none(self.tournament_id),
            sort_by: SortBy::parse(self.sort_by.as_deref()),
            descending,
        };

        let page = PageParams {
            page: self.page,
            limit: self.limit,
        };

        (search, page)
    }
}

/// GET /search/players
///
/// Text, position and location filters are free; the rest need a plan with
/// advanced search.
pub async fn players(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    QueryParams(params): QueryParams<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;
    let (search, page) = params.into_search();

    if search.uses_advanced_filters() {
        let context = state.access(viewer.user_id()).await?;
        require(&context, Capability::AdvancedSearch)?;
    }

    let today = Utc::now().date_naive();
    let (rows, total) = query::player::search(
        &state.pool,
        &search,
        today,
        u64::from(page.limit()),
        page.offset(),
    )
    .await?;

    let items = rows.iter().map(|row| PlayerCard::new(row, today)).collect();

    Ok(ok(Page::new(items, page, total)))
}

/// GET /search/filters
pub async fn filters(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let options = query::player::filter_options(&state.pool, Utc::now().date_naive()).await?;

    Ok(ok(options))
}

/// GET /stats
pub async fn platform_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(query::stats::platform(&state.pool).await?))
}
