pub mod traits;
pub mod file;
pub mod sqlite;

pub use traits::SeenStore;
pub use file::FileSeenStore;
pub use sqlite::{SqliteSeenStore, SqliteStorage};
