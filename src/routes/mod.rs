use std::{sync::Arc, time::Duration};

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use sqlx::SqlitePool;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use unicorn_sport_access::{AccessContext, AccessError, Capability};

use crate::{
    billing::PaymentGateway,
    config::Config,
    error::AppError,
    mailer::Mailer,
    middleware::admin_middleware,
    query::AccessStore,
    storage::MediaStorage,
};

mod admin;
mod auth;
mod contact;
mod health;
mod media;
mod players;
mod saved;
mod search;
mod subscriptions;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub storage: MediaStorage,
    pub payments: Arc<dyn PaymentGateway>,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: SqlitePool,
        storage: MediaStorage,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        let mailer = Mailer::new(&config.server.frontend_url);

        Self {
            config: Arc::new(config),
            pool,
            storage,
            payments,
            mailer,
        }
    }

    /// Resolves the requester's subscription for the gate.
    ///
    /// A slow or failing store is reported as a transient error, never as
    /// a downgrade to free.
    pub async fn access(&self, user_id: Option<&str>) -> Result<AccessContext, AccessError> {
        let store = AccessStore(self.pool.clone());
        let timeout = Duration::from_millis(self.config.server.gate_timeout_ms);

        match tokio::time::timeout(timeout, AccessContext::load(&store, user_id)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(user_id, "Subscription lookup timed out");
                Err(AccessError::TransientStore(anyhow::anyhow!(
                    "subscription lookup timed out"
                )))
            }
        }
    }
}

/// The gate logs its own denials.
pub(crate) fn require(context: &AccessContext, capability: Capability) -> Result<(), AppError> {
    Ok(context.check(capability)?)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats::overview))
        .route("/videos/stats", get(admin::stats::videos))
        .route(
            "/academies",
            get(admin::academies::list).post(admin::academies::create),
        )
        .route(
            "/academies/{id}",
            get(admin::academies::detail)
                .put(admin::academies::update)
                .delete(admin::academies::remove),
        )
        .route(
            "/players",
            get(admin::players::list).post(admin::players::create),
        )
        .route("/players/bulk", post(admin::players::bulk))
        .route(
            "/players/{id}",
            get(admin::players::detail)
                .put(admin::players::update)
                .delete(admin::players::remove),
        )
        .route(
            "/players/{id}/highlights",
            get(admin::highlights::list_by_player),
        )
        .route(
            "/tournaments",
            get(admin::tournaments::list).post(admin::tournaments::create),
        )
        .route("/tournaments/{id}", put(admin::tournaments::update))
        .route(
            "/matches",
            get(admin::matches::list).post(admin::matches::create),
        )
        .route(
            "/matches/{id}",
            get(admin::matches::detail)
                .put(admin::matches::update)
                .delete(admin::matches::remove),
        )
        .route("/matches/{id}/players", post(admin::matches::add_player))
        .route(
            "/matches/{id}/players/{player_id}",
            put(admin::matches::update_player).delete(admin::matches::remove_player),
        )
        .route(
            "/matches/{id}/video/upload-init",
            post(admin::uploads::video_upload_init),
        )
        .route(
            "/matches/{id}/video/part-url",
            post(admin::uploads::video_part_url),
        )
        .route(
            "/matches/{id}/video/complete",
            post(admin::uploads::video_complete),
        )
        .route(
            "/matches/{id}/video",
            post(admin::uploads::save_video).delete(admin::uploads::delete_video),
        )
        .route(
            "/matches/{id}/video/thumbnail/upload-init",
            post(admin::uploads::video_thumbnail_upload_init),
        )
        .route(
            "/matches/{id}/video/thumbnail",
            put(admin::uploads::update_video_thumbnail),
        )
        .route(
            "/matches/{id}/highlights",
            get(admin::highlights::list_by_match),
        )
        .route(
            "/highlights/upload-init",
            post(admin::uploads::highlight_upload_init),
        )
        .route("/highlights", post(admin::highlights::create))
        .route(
            "/highlights/{id}",
            put(admin::highlights::update).delete(admin::highlights::remove),
        )
        .route(
            "/highlights/{id}/thumbnail/upload-init",
            post(admin::uploads::highlight_thumbnail_upload_init),
        )
        .route(
            "/highlights/{id}/thumbnail",
            put(admin::uploads::update_highlight_thumbnail),
        )
        .route("/contact-requests", get(admin::contact::list))
        .route(
            "/contact-requests/{id}/approve",
            post(admin::contact::approve),
        )
        .route("/contact-requests/{id}/reject", post(admin::contact::reject))
        .route("/users", get(admin::users::list))
        .route("/users/{id}", put(admin::users::update))
        .route_layer(axum_middleware::from_fn_with_state(state, admin_middleware))
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/auth", auth::routes())
        .route("/players", get(players::list))
        .route("/players/featured", get(players::featured))
        .route("/players/{id}", get(players::detail))
        .route("/players/{id}/highlights", get(players::highlights))
        .route("/players/{id}/tournaments", get(players::tournaments))
        .route(
            "/players/{id}/save",
            post(saved::save).delete(saved::unsave),
        )
        .route("/players/{id}/contact", post(contact::request_contact))
        .route("/highlights/{id}", get(players::highlight))
        .route("/highlight-types", get(players::highlight_types))
        .route("/videos/highlights", get(media::highlights))
        .route("/videos/full-matches", get(media::full_matches))
        .route("/matches/{id}", get(media::match_detail))
        .route("/matches/{id}/stream", get(media::stream))
        .route("/search/players", get(search::players))
        .route("/search/filters", get(search::filters))
        .route("/stats", get(search::platform_stats))
        .route("/subscriptions/tiers", get(subscriptions::tiers))
        .route("/subscriptions/current", get(subscriptions::current))
        .route("/subscriptions/checkout", post(subscriptions::checkout))
        .route("/subscriptions/portal", post(subscriptions::portal))
        .route("/subscriptions/cancel", post(subscriptions::cancel))
        .route("/webhooks/stripe", post(subscriptions::stripe_webhook))
        .route("/saved-players", get(saved::list))
        .route("/contact-requests", get(contact::my_requests))
        .route("/contact", post(contact::submit_form))
        .nest("/admin", admin_routes(state))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .layer(CompressionLayer::new().br(true).gzip(true))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
