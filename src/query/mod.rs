pub mod academy;
pub mod access;
pub mod contact;
pub mod highlight;
pub mod matches;
pub mod player;
pub mod saved;
pub mod stats;
pub mod subscription;
pub mod tournament;
pub mod user;

pub use access::AccessStore;

/// Current time as unix seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `%term%` for a LIKE filter, with the wildcards in `term` escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    format!("%{escaped}%")
}
