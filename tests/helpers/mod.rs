//! Shared setup for the HTTP integration tests
//!
//! Each test gets its own in-memory database and a router wired to fake
//! object storage and payment gateways.

#![allow(dead_code)]

pub mod stripe_events;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;
use unicorn_sport::{
    AppState, Config,
    auth::{Role, jwt, password},
    billing::{BillingError, CheckoutRequest, CheckoutSession, PaymentGateway},
    config::{
        DatabaseConfig, JwtConfig, ObservabilityConfig, ServerConfig, StorageConfig, StripeConfig,
    },
    query::{
        self,
        highlight::NewHighlight,
        matches::{MatchFields, NewVideo},
        player::{NewPlayer, PlayerFields, VerificationStatus},
        user::{NewUser, UserRow},
    },
    storage::{CompletedPart, MediaStorage, ObjectStore, StorageError},
};
use unicorn_sport_access::{HighlightType, SubscriptionStatus, Tier};

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            gate_timeout_ms: 3000,
            frontend_url: "http://localhost:3000".to_owned(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_owned(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "test-secret-key-that-is-at-least-32-bytes".to_owned(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        },
        storage: StorageConfig::default(),
        stripe: StripeConfig {
            webhook_secret: WEBHOOK_SECRET.to_owned(),
            price_scout: "price_scout".to_owned(),
            price_pro: "price_pro".to_owned(),
            price_club: "price_club".to_owned(),
            ..StripeConfig::default()
        },
        observability: ObservabilityConfig::default(),
    }
}

/// Bucket that hands out predictable URLs without network access.
#[derive(Default)]
pub struct FakeStore {
    pub completed: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl ObjectStore for FakeStore {
    fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!("https://bucket.test/{key}?expires={}", ttl.as_secs()))
    }

    fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!("https://bucket.test/{key}?put&expires={}", ttl.as_secs()))
    }

    async fn create_multipart(
        &self,
        _key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        Ok("upload-1".to_owned())
    }

    fn presign_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        _ttl: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!(
            "https://bucket.test/{key}?uploadId={upload_id}&partNumber={part_number}"
        ))
    }

    async fn complete_multipart(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> Result<(), StorageError> {
        if let Ok(mut completed) = self.completed.lock() {
            completed.push((key.to_owned(), upload_id.to_owned(), parts.len()));
        }

        Ok(())
    }

    fn object_url(&self, key: &str) -> Result<String, StorageError> {
        Ok(format!("https://bucket.test/{key}"))
    }
}

/// Payment provider double that records the checkouts it was asked for.
#[derive(Default)]
pub struct FakeGateway {
    pub checkouts: Mutex<Vec<(String, String, Tier)>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn is_configured(&self) -> bool {
        true
    }

    async fn create_customer(&self, _email: &str, user_id: &str) -> Result<String, BillingError> {
        Ok(format!("cus_{user_id}"))
    }

    async fn create_checkout_session(
        &self,
        request: CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, BillingError> {
        if let Ok(mut checkouts) = self.checkouts.lock() {
            checkouts.push((
                request.customer_id.to_owned(),
                request.price_id.to_owned(),
                request.tier,
            ));
        }

        Ok(CheckoutSession {
            session_id: "cs_test_1".to_owned(),
            checkout_url: "https://checkout.test/cs_test_1".to_owned(),
        })
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        _return_url: &str,
    ) -> Result<String, BillingError> {
        Ok(format!("https://billing.test/{customer_id}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub state: AppState,
    pub store: Arc<FakeStore>,
    pub gateway: Arc<FakeGateway>,
}

pub async fn setup() -> anyhow::Result<TestApp> {
    let pool = unicorn_sport::create_pool("sqlite::memory:", 1).await?;
    unicorn_sport::migrate(&pool).await?;

    let store = Arc::new(FakeStore::default());
    let gateway = Arc::new(FakeGateway::default());

    let state = AppState::new(
        test_config(),
        pool.clone(),
        MediaStorage::new(store.clone(), ""),
        gateway.clone(),
    );

    Ok(TestApp {
        router: unicorn_sport::router(state.clone()),
        pool,
        state,
        store,
        gateway,
    })
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> anyhow::Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> anyhow::Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> anyhow::Result<TestResponse> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> anyhow::Result<TestResponse> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Creates an account directly in the database and signs a token for it.
    pub async fn user(&self, email: &str, role: Role) -> anyhow::Result<(UserRow, String)> {
        let password_hash = password::hash_password(PASSWORD)?;
        let user = query::user::create(
            &self.pool,
            NewUser {
                email,
                password_hash: &password_hash,
                first_name: "Test",
                last_name: "User",
                role,
            },
            query::now(),
        )
        .await?;

        let token = jwt::generate_token(&self.state.config.jwt, &user.id, &user.email, role)?;

        Ok((user, token))
    }

    /// A scout account on `tier` with the given status.
    pub async fn subscriber(
        &self,
        email: &str,
        tier: Tier,
        status: SubscriptionStatus,
    ) -> anyhow::Result<(UserRow, String)> {
        let (user, token) = self.user(email, Role::Scout).await?;
        query::subscription::upsert_tier(&self.pool, &user.id, tier, status, query::now()).await?;

        Ok((user, token))
    }

    pub async fn admin(&self) -> anyhow::Result<(UserRow, String)> {
        self.user("admin@unicorn.test", Role::Admin).await
    }

    pub async fn player(
        &self,
        created_by: &str,
        first_name: &str,
        status: VerificationStatus,
    ) -> anyhow::Result<String> {
        self.player_with(created_by, first_name, "2008-05-14", "Forward", status)
            .await
    }

    pub async fn player_with(
        &self,
        created_by: &str,
        first_name: &str,
        date_of_birth: &str,
        position: &str,
        status: VerificationStatus,
    ) -> anyhow::Result<String> {
        let fields = PlayerFields {
            preferred_foot: Some("left".to_owned()),
            height_cm: Some(178),
            verification_status: Some(status),
            ..PlayerFields::default()
        };

        query::player::create(
            &self.pool,
            NewPlayer {
                first_name,
                last_name: "Okafor",
                date_of_birth,
                position,
                country: "Nigeria",
                fields: &fields,
                created_by,
            },
            query::now(),
        )
        .await
    }

    /// A match with a ready full-match video.
    pub async fn match_with_video(&self) -> anyhow::Result<(String, String)> {
        let match_id = query::matches::create(
            &self.pool,
            "Final",
            "2025-06-01",
            "Lagos Stars",
            "Abuja United",
            &MatchFields::default(),
            query::now(),
        )
        .await?;

        let video_key = format!("matches/{match_id}/video/final.mp4");
        let video_id = query::matches::create_video(
            &self.pool,
            NewVideo {
                match_id: &match_id,
                video_key: &video_key,
                thumbnail_url: None,
                duration_seconds: Some(5400),
                file_size_bytes: None,
                price_cents: 999,
                currency: "USD",
            },
            query::now(),
        )
        .await?;

        Ok((match_id, video_id))
    }

    pub async fn highlight(
        &self,
        player_id: &str,
        highlight_type: HighlightType,
    ) -> anyhow::Result<String> {
        query::highlight::create(
            &self.pool,
            NewHighlight {
                player_id,
                match_id: None,
                highlight_type,
                video_key: "highlights/clip.mp4",
                thumbnail_url: None,
                duration_seconds: Some(30),
                title: Some("Clip"),
                description: None,
                timestamp_in_match: None,
            },
            query::now(),
        )
        .await
    }
}
