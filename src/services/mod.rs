pub mod state_tracker;
pub mod poller;
pub mod pipeline;
pub mod notifier;

pub use state_tracker::StateTracker;
pub use poller::{FeedPoller, NoveltyPolicy, PollOutcome, RecencyPolicy, SelectionPolicy};
pub use pipeline::Pipeline;
pub use notifier::{ArticleTier, DeliveryReport, DeliveryTier, Notifier, Pacing};
