pub mod error;
pub mod navigation;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use navigation::{InMemoryNavigationCache, NavigationKey, NavigationSnapshot, SNAPSHOT_VERSION};
pub use store::AppStore;

/// Per-view snapshots keyed by history location, restored when the user navigates back.
pub trait NavigationStateCache: Send + Sync {
    fn save(&self, key: &NavigationKey, snapshot: &NavigationSnapshot) -> StorageResult<()>;
    fn load(&self, key: &NavigationKey) -> StorageResult<Option<NavigationSnapshot>>;
    /// Clears only the scroll offset so it is applied at most once.
    fn consume_scroll_offset(&self, key: &NavigationKey) -> StorageResult<()>;

    fn take_for_mount(&self, key: &NavigationKey) -> StorageResult<Option<NavigationSnapshot>> {
        let snapshot = self.load(key)?;
        if snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.scroll_offset.is_some())
        {
            self.consume_scroll_offset(key)?;
        }
        Ok(snapshot)
    }
}
