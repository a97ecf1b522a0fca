use crate::errors::RelayResult;

/// Durable backing for the seen-item state
#[cfg_attr(test, mockall::automock)]
pub trait SeenStore: Send + Sync {
    /// Identifiers in insertion order, oldest first. A store that does not exist yet is empty.
    fn load(&self) -> RelayResult<Vec<String>>;

    /// Replace the stored identifiers with `ids`, keeping their order
    fn save(&self, ids: &[String]) -> RelayResult<()>;
}
