//! Account administration

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use unicorn_sport_access::Tier;

use crate::{
    auth::{AuthUser, Role},
    error::AppError,
    query::{self, user::UserFilter},
    response::{JsonBody, Page, PageParams, QueryParams, ok, parse_id},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<Role>,
    pub subscription_tier: Option<Tier>,
    pub search: Option<String>,
}

/// GET /admin/users
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let filter = UserFilter {
        role: params.role,
        tier: params.subscription_tier,
        search: params.search,
    };

    let (rows, total) = query::user::list_admin(
        &state.pool,
        &filter,
        u64::from(page.limit()),
        page.offset(),
    )
    .await?;

    Ok(ok(Page::new(rows, page, total)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserInput {
    pub is_active: Option<bool>,
    pub role: Option<Role>,
}

/// PUT /admin/users/{id}
pub async fn update(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateUserInput>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    // admins cannot disable or demote themselves
    if id == admin.id && (input.is_active == Some(false) || input.role.is_some_and(|r| !r.is_admin()))
    {
        return Err(AppError::bad_request(
            "SELF_DEMOTION",
            "You cannot disable or demote your own account",
        ));
    }

    if !query::user::update_access(&state.pool, &id, input.is_active, input.role, query::now())
        .await?
    {
        return Err(AppError::NotFound("User"));
    }

    if input.is_active == Some(false) {
        query::user::revoke_refresh_tokens(&state.pool, &id).await?;
    }

    info!(
        admin_id = %admin.id,
        user_id = %id,
        is_active = ?input.is_active,
        role = ?input.role,
        "User updated"
    );

    let user = query::user::find_by_id(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    Ok(ok(query::user::UserView::from(&user)))
}
