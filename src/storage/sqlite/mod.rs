pub mod connection;
pub mod seen_repository;

pub use connection::SqliteStorage;
pub use seen_repository::SqliteSeenStore;
