pub mod auth;
pub mod billing;
pub mod config;
pub mod db;
pub mod error;
pub mod mailer;
pub mod middleware;
pub mod observability;
pub mod query;
pub mod response;
pub mod routes;
pub mod storage;

pub use config::Config;
pub use db::{create_pool, migrate};
pub use routes::{AppState, router};
