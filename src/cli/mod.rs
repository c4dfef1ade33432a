pub mod database;
pub mod server;
pub mod user;
