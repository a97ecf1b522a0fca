pub mod feed_item;
pub mod translation;
pub mod notification;

pub use feed_item::{FeedEntry, FeedItem};
pub use translation::TranslationResult;
pub use notification::{truncate_text, MessageBuilder};
