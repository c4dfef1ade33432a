//! Object storage for match videos and highlight clips

mod s3;
pub mod sigv4;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

pub use s3::S3Store;

/// Lifetime of every presigned URL handed to clients.
pub const URL_TTL: Duration = Duration::from_secs(3600);

const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * MB;

pub const MAX_VIDEO_BYTES: u64 = 25 * GB;
pub const MAX_HIGHLIGHT_BYTES: u64 = GB;
pub const MAX_THUMBNAIL_BYTES: u64 = 10 * MB;
pub const MULTIPART_THRESHOLD_BYTES: u64 = 100 * MB;
pub const PART_SIZE_BYTES: u64 = 10 * MB;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object storage is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("storage rejected the request with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected response: {0}")]
    InvalidResponse(String),

    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct CompletedPart {
    #[validate(range(min = 1, max = 10000))]
    pub part_number: u32,
    #[validate(custom(function = "validate_etag"))]
    pub etag: String,
}

/// Part ETags are hex digests, optionally quoted.
fn validate_etag(etag: &str) -> Result<(), validator::ValidationError> {
    let digest = etag.strip_prefix('"').and_then(|e| e.strip_suffix('"')).unwrap_or(etag);

    if !digest.is_empty() && digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(());
    }

    let mut error = validator::ValidationError::new("invalid_etag");
    error.message = Some(std::borrow::Cow::from("ETag must be a hex digest"));
    Err(error)
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Starts a multipart upload and returns its upload id.
    async fn create_multipart(&self, key: &str, content_type: &str)
    -> Result<String, StorageError>;

    fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StorageError>;

    /// Unsigned address of an object, for publicly readable keys.
    fn object_url(&self, key: &str) -> Result<String, StorageError>;
}

/// The object store plus the CDN that fronts it.
#[derive(Clone)]
pub struct MediaStorage {
    store: Arc<dyn ObjectStore>,
    cdn_url: Option<String>,
}

impl MediaStorage {
    pub fn new(store: Arc<dyn ObjectStore>, cdn_url: &str) -> Self {
        let cdn_url = cdn_url.trim_end_matches('/');

        Self {
            store,
            cdn_url: (!cdn_url.is_empty()).then(|| cdn_url.to_owned()),
        }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    /// CDN URL when one is configured, otherwise a presigned GET.
    pub fn stream_url(&self, key: &str) -> Result<String, StorageError> {
        match &self.cdn_url {
            Some(cdn) => Ok(format!("{cdn}/{}", sigv4::encode_path(key))),
            None => self.store.presign_get(key, URL_TTL),
        }
    }

    /// Where a thumbnail is served from: the CDN, or the bucket itself.
    pub fn public_url(&self, key: &str) -> Result<String, StorageError> {
        match &self.cdn_url {
            Some(cdn) => Ok(format!("{cdn}/{}", sigv4::encode_path(key))),
            None => self.store.object_url(key),
        }
    }
}

/// How a file of a given size gets uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPlan {
    Single,
    Multipart { part_size: u64, part_count: u64 },
}

impl UploadPlan {
    pub fn for_size(file_size: u64) -> Self {
        if file_size <= MULTIPART_THRESHOLD_BYTES {
            return UploadPlan::Single;
        }

        UploadPlan::Multipart {
            part_size: PART_SIZE_BYTES,
            part_count: file_size.div_ceil(PART_SIZE_BYTES),
        }
    }
}

/// Keeps a client-supplied file name inside its key prefix.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let cleaned = cleaned.replace("..", "_");

    if cleaned.is_empty() {
        "file".to_owned()
    } else {
        cleaned
    }
}

pub fn match_video_key(match_id: &str, file_name: &str) -> String {
    format!("matches/{match_id}/video/{}", sanitize_file_name(file_name))
}

pub fn match_thumbnail_key(match_id: &str, file_name: &str) -> String {
    format!("thumbnails/matches/{match_id}/{}", sanitize_file_name(file_name))
}

pub fn highlight_thumbnail_key(highlight_id: &str, file_name: &str) -> String {
    format!("thumbnails/highlights/{highlight_id}/{}", sanitize_file_name(file_name))
}

pub fn highlight_key(player_id: &str, file_name: &str) -> String {
    let unique = uuid::Uuid::new_v4().simple().to_string();

    format!(
        "highlights/{player_id}/{}/{}",
        &unique[..8],
        sanitize_file_name(file_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_files_use_single_put() {
        assert_eq!(UploadPlan::for_size(5 * MB), UploadPlan::Single);
        assert_eq!(UploadPlan::for_size(100 * MB), UploadPlan::Single);
    }

    #[test]
    fn test_large_files_are_split_in_ten_megabyte_parts() {
        assert_eq!(
            UploadPlan::for_size(101 * MB),
            UploadPlan::Multipart {
                part_size: PART_SIZE_BYTES,
                part_count: 11,
            }
        );
    }

    #[test]
    fn test_file_names_cannot_escape_prefix() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "____etc_passwd");
        assert_eq!(sanitize_file_name("final match.mp4"), "final_match.mp4");
        assert_eq!(sanitize_file_name("   "), "file");
    }

    #[test]
    fn test_highlight_key_layout() {
        let key = highlight_key("p1", "goal.mp4");
        let parts: Vec<&str> = key.split('/').collect();

        assert_eq!(parts[0], "highlights");
        assert_eq!(parts[1], "p1");
        assert_eq!(parts[2].len(), 8);
        assert_eq!(parts[3], "goal.mp4");
    }

    #[test]
    fn test_etag_must_be_a_hex_digest() {
        assert!(validate_etag("\"9b2cf535f27731c974343645a3985328\"").is_ok());
        assert!(validate_etag("9B2CF535").is_ok());
        assert!(validate_etag("\"\"").is_err());
        assert!(validate_etag("a</ETag>").is_err());
        assert!(validate_etag("a&b").is_err());
    }
}
