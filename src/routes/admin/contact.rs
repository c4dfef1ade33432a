use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::AuthUser,
    error::AppError,
    query::{
        self,
        contact::{ContactRequestRow, ContactStatus},
    },
    response::{Envelope, Page, PageParams, QueryParams, ok, parse_id},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ContactStatus>,
}

/// GET /admin/contact-requests
pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };

    let (rows, total) = query::contact::list_admin(
        &state.pool,
        params.status,
        u64::from(page.limit()),
        page.offset(),
    )
    .await?;

    Ok(ok(Page::new(rows, page, total)))
}

async fn moderate(
    state: &AppState,
    admin: &AuthUser,
    id: &str,
    status: ContactStatus,
) -> Result<Json<Envelope<ContactRequestRow>>, AppError> {
    let id = parse_id(id)?;

    if !query::contact::set_status(&state.pool, &id, status, query::now()).await? {
        return Err(AppError::NotFound("Contact request"));
    }

    info!(admin_id = %admin.id, request_id = %id, %status, "Contact request moderated");

    let request = query::contact::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Contact request"))?;

    Ok(ok(request))
}

/// POST /admin/contact-requests/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    moderate(&state, &admin, &id, ContactStatus::Approved).await
}

/// POST /admin/contact-requests/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    moderate(&state, &admin, &id, ContactStatus::Rejected).await
}
