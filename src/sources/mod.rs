pub mod traits;
pub mod rss_atom;
pub mod text;

pub use traits::FeedSource;
pub use rss_atom::RssAtomSource;
