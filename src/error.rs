use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use thiserror::Error;
use unicorn_sport_access::AccessError;

use crate::{billing::BillingError, storage::StorageError};

/// Where the client is sent to pick a paid plan.
pub const UPGRADE_URL: &str = "/pricing";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    BadRequest {
        code: &'static str,
        message: String,
    },

    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{message}")]
    Unauthorized {
        code: &'static str,
        message: String,
    },

    #[error("{message}")]
    Forbidden {
        code: &'static str,
        message: String,
    },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{message}")]
    Conflict {
        code: &'static str,
        message: String,
    },

    #[error("Too many requests")]
    RateLimited,

    #[error("{message}")]
    Unavailable {
        code: &'static str,
        message: String,
    },

    #[error(transparent)]
    Access(#[from] AccessError),

    /// Same as `Access`, but a missing tier is answered with 402.
    #[error("Subscription required: {0}")]
    Paywall(AccessError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Billing error: {0}")]
    Billing(#[from] BillingError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::bad_request("VALIDATION_ERROR", message)
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn unavailable(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Unavailable {
            code,
            message: message.into(),
        }
    }

    pub fn auth_required() -> Self {
        Self::unauthorized("AUTH_REQUIRED", "Authentication required")
    }

    /// Turns a denial on a full-match listing into a 402.
    pub fn paywall(err: AccessError) -> Self {
        match err {
            AccessError::InsufficientTier { .. } => AppError::Paywall(err),
            other => AppError::Access(other),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, String, Map<String, Value>) {
        let mut extra = Map::new();

        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone())
            }
            AppError::Validation(errors) => {
                extra.insert(
                    "details".to_owned(),
                    serde_json::to_value(errors).unwrap_or(Value::Null),
                );
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    self.to_string(),
                )
            }
            AppError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, *code, message.clone())
            }
            AppError::Forbidden { code, message } => (StatusCode::FORBIDDEN, *code, message.clone()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, *code, message.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests. Please try again later.".to_owned(),
            ),
            AppError::Unavailable { code, message } => {
                (StatusCode::SERVICE_UNAVAILABLE, *code, message.clone())
            }
            AppError::Access(err) => access_parts(err, &mut extra),
            AppError::Paywall(err) => {
                let (_, _, message) = access_parts(err, &mut extra);
                (StatusCode::PAYMENT_REQUIRED, "SUBSCRIPTION_REQUIRED", message)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                internal()
            }
            AppError::Storage(StorageError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORAGE_NOT_CONFIGURED",
                "Video storage is not configured".to_owned(),
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {}", e);
                internal()
            }
            AppError::Billing(BillingError::NotConfigured) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STRIPE_NOT_CONFIGURED",
                "Payments are not configured".to_owned(),
            ),
            AppError::Billing(e) => {
                tracing::error!("Billing error: {}", e);
                internal()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                internal()
            }
        };

        (status, code, message, extra)
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An unexpected error occurred. Please try again later.".to_owned(),
    )
}

fn access_parts(
    err: &AccessError,
    extra: &mut Map<String, Value>,
) -> (StatusCode, &'static str, String) {
    match err {
        AccessError::AuthenticationRequired => (
            StatusCode::UNAUTHORIZED,
            "AUTH_REQUIRED",
            "Authentication required".to_owned(),
        ),
        AccessError::SubscriptionInactive {
            current_tier,
            status,
        } => {
            extra.insert("current_tier".to_owned(), json!(current_tier));
            extra.insert("status".to_owned(), json!(status));
            (
                StatusCode::FORBIDDEN,
                "SUBSCRIPTION_INACTIVE",
                format!("Your subscription is {status}. Update your billing details to continue."),
            )
        }
        AccessError::InsufficientTier {
            current_tier,
            required_tier,
        } => {
            extra.insert("current_tier".to_owned(), json!(current_tier));
            extra.insert("required_tier".to_owned(), json!(required_tier));
            extra.insert("upgrade_url".to_owned(), json!(UPGRADE_URL));
            (
                StatusCode::FORBIDDEN,
                "UPGRADE_REQUIRED",
                format!("This feature requires the {required_tier} tier or higher"),
            )
        }
        AccessError::NotFound(resource) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{resource} not found"),
        ),
        AccessError::TransientStore(e) => {
            tracing::error!("Subscription lookup failed: {:?}", e);
            extra.insert("retryable".to_owned(), Value::Bool(true));
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "TRANSIENT_ERROR",
                "Could not verify your subscription. Please retry.".to_owned(),
            )
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, extra) = self.parts();

        let mut error = Map::new();
        error.insert("code".to_owned(), json!(code));
        error.insert("message".to_owned(), json!(message));
        error.extend(extra);

        (
            status,
            Json(json!({
                "success": false,
                "error": error,
            })),
        )
            .into_response()
    }
}
