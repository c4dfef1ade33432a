//! Presigned uploads for match videos, highlight clips and their thumbnails
//!
//! Bytes never pass through the API: clients PUT straight to the bucket
//! with the URLs handed out here.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::AppError,
    query::{self, matches::NewVideo},
    response::{JsonBody, created, message, ok, parse_id},
    routes::AppState,
    storage::{
        CompletedPart, MAX_HIGHLIGHT_BYTES, MAX_THUMBNAIL_BYTES, MAX_VIDEO_BYTES, URL_TTL,
        UploadPlan, highlight_key, highlight_thumbnail_key, match_thumbnail_key, match_video_key,
    },
};

const DEFAULT_PRICE_CENTS: i64 = 999;
const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Deserialize, Validate)]
pub struct UploadInitInput {
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "Content type is required"))]
    pub content_type: String,
    #[validate(range(min = 1, message = "File size must be positive"))]
    pub file_size: u64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "upload_type", rename_all = "snake_case")]
pub enum UploadTicket {
    Single {
        video_key: String,
        upload_url: String,
        expires_in: u64,
    },
    Multipart {
        video_key: String,
        upload_id: String,
        part_size: u64,
        part_count: u64,
    },
}

fn check_size(file_size: u64, max: u64, label: &str) -> Result<(), AppError> {
    if file_size > max {
        return Err(AppError::bad_request(
            "FILE_TOO_LARGE",
            format!("File too large. Maximum {label}."),
        ));
    }

    Ok(())
}

async fn require_match(state: &AppState, id: &str) -> Result<String, AppError> {
    let id = parse_id(id)?;

    let game = query::matches::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Match"))?;

    Ok(game.id)
}

/// Keys sent back by the client must stay under the prefix they were issued for.
fn check_key(prefix: &str, key: &str, message: &'static str) -> Result<(), AppError> {
    if !key.starts_with(prefix) || key.len() == prefix.len() || key.contains("..") {
        return Err(AppError::bad_request("INVALID_KEY", message));
    }

    Ok(())
}

fn check_video_key(match_id: &str, key: &str) -> Result<(), AppError> {
    check_key(
        &format!("matches/{match_id}/video/"),
        key,
        "Video key does not belong to this match",
    )
}

/// POST /admin/matches/{id}/video/upload-init
pub async fn video_upload_init(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UploadInitInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_size(input.file_size, MAX_VIDEO_BYTES, "25GB")?;

    let match_id = require_match(&state, &id).await?;

    if query::matches::find_video(&state.pool, &match_id).await?.is_some() {
        return Err(video_exists());
    }

    let video_key = match_video_key(&match_id, &input.file_name);
    let store = state.storage.store();

    let ticket = match UploadPlan::for_size(input.file_size) {
        UploadPlan::Single => UploadTicket::Single {
            upload_url: store.presign_put(&video_key, &input.content_type, URL_TTL)?,
            expires_in: URL_TTL.as_secs(),
            video_key,
        },
        UploadPlan::Multipart {
            part_size,
            part_count,
        } => UploadTicket::Multipart {
            upload_id: store
                .create_multipart(&video_key, &input.content_type)
                .await?,
            part_size,
            part_count,
            video_key,
        },
    };

    info!(
        admin_id = %admin.id,
        match_id = %match_id,
        file_size = input.file_size,
        "Match video upload started"
    );

    Ok(ok(ticket))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PartUrlInput {
    pub video_key: String,
    #[validate(length(min = 1))]
    pub upload_id: String,
    #[validate(range(min = 1, max = 10000, message = "Part number must be between 1 and 10000"))]
    pub part_number: u32,
}

/// POST /admin/matches/{id}/video/part-url
pub async fn video_part_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<PartUrlInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    let match_id = require_match(&state, &id).await?;
    check_video_key(&match_id, &input.video_key)?;

    let upload_url = state.storage.store().presign_part(
        &input.video_key,
        &input.upload_id,
        input.part_number,
        URL_TTL,
    )?;

    Ok(ok(serde_json::json!({
        "upload_url": upload_url,
        "part_number": input.part_number,
        "expires_in": URL_TTL.as_secs(),
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteInput {
    pub video_key: String,
    #[validate(length(min = 1))]
    pub upload_id: String,
    #[validate(length(min = 1, message = "At least one part is required"), nested)]
    pub parts: Vec<CompletedPart>,
}

/// POST /admin/matches/{id}/video/complete
pub async fn video_complete(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(mut input): JsonBody<CompleteInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    let match_id = require_match(&state, &id).await?;
    check_video_key(&match_id, &input.video_key)?;

    input.parts.sort_by_key(|part| part.part_number);

    state
        .storage
        .store()
        .complete_multipart(&input.video_key, &input.upload_id, &input.parts)
        .await?;

    info!(
        admin_id = %admin.id,
        match_id = %match_id,
        parts = input.parts.len(),
        "Match video upload completed"
    );

    Ok(ok(serde_json::json!({ "video_key": input.video_key })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveVideoInput {
    pub video_key: String,
    pub thumbnail_url: Option<String>,
    #[validate(range(min = 0))]
    pub duration_seconds: Option<i64>,
    #[validate(range(min = 0))]
    pub file_size_bytes: Option<i64>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,
}

fn video_exists() -> AppError {
    AppError::conflict(
        "VIDEO_EXISTS",
        "Video already exists for this match. Delete it first to replace.",
    )
}

/// POST /admin/matches/{id}/video
pub async fn save_video(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<SaveVideoInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    let match_id = require_match(&state, &id).await?;
    check_video_key(&match_id, &input.video_key)?;

    if query::matches::find_video(&state.pool, &match_id).await?.is_some() {
        return Err(video_exists());
    }

    let currency = input
        .currency
        .as_deref()
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned());

    query::matches::create_video(
        &state.pool,
        NewVideo {
            match_id: &match_id,
            video_key: &input.video_key,
            thumbnail_url: input.thumbnail_url.as_deref(),
            duration_seconds: input.duration_seconds,
            file_size_bytes: input.file_size_bytes,
            price_cents: input.price_cents.unwrap_or(DEFAULT_PRICE_CENTS),
            currency: &currency,
        },
        query::now(),
    )
    .await?;

    info!(admin_id = %admin.id, match_id = %match_id, "Match video saved");

    let video = query::matches::find_video(&state.pool, &match_id)
        .await?
        .ok_or(AppError::NotFound("Match video"))?;

    Ok(created(video))
}

/// DELETE /admin/matches/{id}/video
pub async fn delete_video(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let match_id = require_match(&state, &id).await?;

    if !query::matches::delete_video(&state.pool, &match_id).await? {
        return Err(AppError::NotFound("Match video"));
    }

    info!(admin_id = %admin.id, match_id = %match_id, "Match video deleted");

    Ok(message("Match video deleted"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct HighlightUploadInput {
    pub player_id: String,
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "Content type is required"))]
    pub content_type: String,
    #[validate(range(min = 1, message = "File size must be positive"))]
    pub file_size: u64,
}

/// POST /admin/highlights/upload-init
pub async fn highlight_upload_init(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<HighlightUploadInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_size(input.file_size, MAX_HIGHLIGHT_BYTES, "1GB")?;

    let player_id = parse_id(&input.player_id)?;
    let player = query::player::find(&state.pool, &player_id)
        .await?
        .ok_or(AppError::NotFound("Player"))?;

    let video_key = highlight_key(&player.id, &input.file_name);
    let upload_url = state
        .storage
        .store()
        .presign_put(&video_key, &input.content_type, URL_TTL)?;

    Ok(ok(UploadTicket::Single {
        video_key,
        upload_url,
        expires_in: URL_TTL.as_secs(),
    }))
}

fn check_image(input: &UploadInitInput) -> Result<(), AppError> {
    if !input.content_type.starts_with("image/") {
        return Err(AppError::bad_request(
            "INVALID_CONTENT_TYPE",
            "Thumbnails must be images",
        ));
    }

    check_size(input.file_size, MAX_THUMBNAIL_BYTES, "10MB")
}

#[derive(Debug, Serialize)]
pub struct ThumbnailTicket {
    pub thumbnail_key: String,
    pub upload_url: String,
    pub expires_in: u64,
}

fn thumbnail_ticket(state: &AppState, key: String, content_type: &str) -> Result<ThumbnailTicket, AppError> {
    let upload_url = state.storage.store().presign_put(&key, content_type, URL_TTL)?;

    Ok(ThumbnailTicket {
        thumbnail_key: key,
        upload_url,
        expires_in: URL_TTL.as_secs(),
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct ThumbnailInput {
    #[validate(length(min = 1, message = "Thumbnail key is required"))]
    pub thumbnail_key: String,
}

/// POST /admin/matches/{id}/video/thumbnail/upload-init
pub async fn video_thumbnail_upload_init(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UploadInitInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_image(&input)?;

    let match_id = require_match(&state, &id).await?;
    query::matches::find_video(&state.pool, &match_id)
        .await?
        .ok_or(AppError::NotFound("Match video"))?;

    let key = match_thumbnail_key(&match_id, &input.file_name);

    Ok(ok(thumbnail_ticket(&state, key, &input.content_type)?))
}

/// PUT /admin/matches/{id}/video/thumbnail
pub async fn update_video_thumbnail(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ThumbnailInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    let match_id = require_match(&state, &id).await?;
    check_key(
        &format!("thumbnails/matches/{match_id}/"),
        &input.thumbnail_key,
        "Thumbnail key does not belong to this match",
    )?;

    let thumbnail_url = state.storage.public_url(&input.thumbnail_key)?;
    if !query::matches::set_video_thumbnail(&state.pool, &match_id, &thumbnail_url, query::now())
        .await?
    {
        return Err(AppError::NotFound("Match video"));
    }

    info!(admin_id = %admin.id, match_id = %match_id, "Match video thumbnail updated");

    Ok(ok(serde_json::json!({ "thumbnail_url": thumbnail_url })))
}

async fn require_highlight(state: &AppState, id: &str) -> Result<String, AppError> {
    let id = parse_id(id)?;

    let highlight = query::highlight::find(&state.pool, &id)
        .await?
        .ok_or(AppError::NotFound("Highlight"))?;

    Ok(highlight.id)
}

/// POST /admin/highlights/{id}/thumbnail/upload-init
pub async fn highlight_thumbnail_upload_init(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UploadInitInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    check_image(&input)?;

    let highlight_id = require_highlight(&state, &id).await?;
    let key = highlight_thumbnail_key(&highlight_id, &input.file_name);

    Ok(ok(thumbnail_ticket(&state, key, &input.content_type)?))
}

/// PUT /admin/highlights/{id}/thumbnail
pub async fn update_highlight_thumbnail(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ThumbnailInput>,
) -> Result<impl IntoResponse, AppError> {
    input.validate()?;
    let highlight_id = require_highlight(&state, &id).await?;
    check_key(
        &format!("thumbnails/highlights/{highlight_id}/"),
        &input.thumbnail_key,
        "Thumbnail key does not belong to this highlight",
    )?;

    let thumbnail_url = state.storage.public_url(&input.thumbnail_key)?;
    if !query::highlight::set_thumbnail(&state.pool, &highlight_id, &thumbnail_url, query::now())
        .await?
    {
        return Err(AppError::NotFound("Highlight"));
    }

    info!(admin_id = %admin.id, highlight_id = %highlight_id, "Highlight thumbnail updated");

    Ok(ok(serde_json::json!({ "thumbnail_url": thumbnail_url })))
}
