//! Full match videos and the public highlight feed

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use unicorn_sport_access::{
    ContentKind, authorize_full_match_listing, authorize_stream, full_match_locked,
};

use super::AppState;
use crate::{
    auth::MaybeAuthUser,
    error::AppError,
    query::{
        self,
        highlight::{FeedFilter, PlayerHighlightRow},
        matches::{FullMatchFilter, LineupRow, MatchRow},
    },
    response::{Page, PageParams, QueryParams, ok, parse_id},
    routes::players::{HighlightView, parse_highlight_type},
    storage::URL_TTL,
};

#[derive(Debug, Deserialize)]
pub struct FullMatchParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub tournament_id: Option<String>,
    pub player_id: Option<String>,
}

/// GET /videos/full-matches
///
/// The whole listing is refused when the viewer cannot watch full matches.
pub async fn full_matches(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    QueryParams(params): QueryParams<FullMatchParams>,
) -> Result<impl IntoResponse, AppError> {
    let context = state.access(viewer.user_id()).await?;

    authorize_full_match_listing(&context).map_err(AppError::paywall)?;

    let filter = FullMatchFilter {
        tournament_id: params.tournament_id,
        player_id: params.player_id,
    };
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };
    let (rows, total) = query::matches::list_full_matches(
        &state.pool,
        &filter,
        u64::from(page.limit()),
        page.offset(),
    )
    .await?;

    Ok(ok(Page::new(rows, page, total)))
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(rename = "type")]
    pub highlight_type: Option<String>,
    pub player_id: Option<String>,
    pub tournament_id: Option<String>,
}

/// A highlight in a feed that mixes players.
#[derive(Debug, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub highlight: HighlightView,
    pub player_first_name: String,
    pub player_last_name: String,
    pub player_photo_url: Option<String>,
}

impl FeedItem {
    pub fn new(state: &AppState, row: PlayerHighlightRow) -> Self {
        Self {
            highlight: HighlightView::new(state, row.highlight),
            player_first_name: row.player_first_name,
            player_last_name: row.player_last_name,
            player_photo_url: row.player_photo_url,
        }
    }
}

/// GET /videos/highlights
///
/// Highlights are free, so nobody is gated here.
pub async fn highlights(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<FeedParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = FeedFilter {
        highlight_type: parse_highlight_type(params.highlight_type.as_deref())?,
        player_id: params.player_id.as_deref().map(parse_id).transpose()?,
        tournament_id: params.tournament_id.as_deref().map(parse_id).transpose()?,
    };
    let page = PageParams {
        page: params.page,
        limit: params.limit,
    };

    let (rows, total) =
        query::highlight::list_public(&state.pool, &filter, u64::from(page.limit()), page.offset())
            .await?;

    let items: Vec<FeedItem> = rows
        .into_iter()
        .map(|row| FeedItem::new(&state, row))
        .collect();

    Ok(ok(Page::new(items, page, total)))
}

#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub stream_url: String,
    pub expires_in: u64,
}

/// GET /matches/{id}/stream
pub async fn stream(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let video = match query::matches::find(&state.pool, &id).await? {
        Some(found) => query::matches::find_ready_video(&state.pool, &found.id).await?,
        None => None,
    };

    let context = state.access(viewer.user_id()).await?;
    let video = authorize_stream(&context, video, ContentKind::FullMatch, "Match video")?;

    let stream_url = state.storage.stream_url(&video.video_key)?;
    query::matches::increment_views(&state.pool, &video.id).await?;

    tracing::info!(
        user_id = context.user_id.as_deref().unwrap_or("anonymous"),
        match_id = %id,
        "Full match stream issued"
    );

    Ok(ok(StreamResponse {
        stream_url,
        expires_in: URL_TTL.as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct MatchDetail {
    #[serde(flatten)]
    pub game: MatchRow,
    pub players: Vec<LineupRow>,
    pub has_full_match: bool,
    pub full_match_locked: bool,
    pub price_cents: Option<i64>,
    pub currency: Option<String>,
}

/// GET /matches/{id}
pub async fn match_detail(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let game = query::matches::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;
    let players = query::matches::lineup(&state.pool, &game.id).await?;
    let video = query::matches::find_ready_video(&state.pool, &game.id).await?;
    let context = state.access(viewer.user_id()).await?;

    Ok(ok(MatchDetail {
        players,
        has_full_match: video.is_some(),
        full_match_locked: full_match_locked(&context),
        price_cents: video.as_ref().map(|video| video.price_cents),
        currency: video.map(|video| video.currency),
        game,
    }))
}
