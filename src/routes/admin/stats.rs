use axum::{extract::State, response::IntoResponse};
use serde::Serialize;

use crate::{
    error::AppError,
    query::{self, highlight::HighlightCounts, matches::VideoCounts},
    response::ok,
    routes::AppState,
};

/// GET /admin/stats
pub async fn overview(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    Ok(ok(query::stats::admin(&state.pool, query::now()).await?))
}

#[derive(Debug, Serialize)]
pub struct VideoStats {
    pub total: i64,
    pub total_views: i64,
    pub highlights: HighlightCounts,
    pub full_matches: VideoCounts,
}

/// GET /admin/videos/stats
pub async fn videos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (highlights, full_matches) = tokio::try_join!(
        query::highlight::counts(&state.pool),
        query::matches::video_counts(&state.pool),
    )?;

    Ok(ok(VideoStats {
        total: highlights.total + full_matches.total,
        total_views: highlights.views + full_matches.views,
        highlights,
        full_matches,
    }))
}
