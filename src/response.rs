use axum::{
    Json,
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, ok(data))
}

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn message(message: impl Into<String>) -> Json<Envelope<MessageBody>> {
    ok(MessageBody {
        message: message.into(),
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i = i64::from(limit.max(1));

        Self {
            page,
            limit,
            total,
            total_pages: (total + limit_i - 1) / limit_i,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: PageParams, total: i64) -> Self {
        Self {
            items,
            pagination: Pagination::new(page.page(), page.limit(), total),
        }
    }
}

/// `?page=&limit=` with page >= 1 and limit clamped to 1..=100.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub const DEFAULT_LIMIT: u32 = 20;
    pub const MAX_LIMIT: u32 = 100;

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

/// `Json` whose rejection is rendered as a VALIDATION_ERROR envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// `Query` whose rejection is rendered as a VALIDATION_ERROR envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Ids are UUID strings; anything else is a 400.
pub fn parse_id(raw: &str) -> Result<String, AppError> {
    uuid::Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::bad_request("INVALID_UUID", "Invalid id format"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_clamp() {
        let params = PageParams {
            page: Some(0),
            limit: Some(500),
        };

        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 100);
        assert_eq!(params.offset(), 0);

        let params = PageParams {
            page: Some(3),
            limit: None,
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).total_pages, 2);
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());

        let id = uuid::Uuid::new_v4().to_string();
        assert_eq!(parse_id(&id).unwrap(), id);
    }
}
