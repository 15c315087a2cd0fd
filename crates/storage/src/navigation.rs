use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use dmview_api::Item;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::error::{EncodeSnapshotSnafu, LockPoisonedSnafu, StorageResult};
use super::NavigationStateCache;

/// Bumped whenever `NavigationSnapshot` changes shape; older entries read as misses.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Identifies one view inside one history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigationKey {
    pub location_key: String,
    pub view_id: String,
}

impl NavigationKey {
    pub fn new(location_key: impl Into<String>, view_id: impl Into<String>) -> Self {
        Self {
            location_key: location_key.into(),
            view_id: view_id.into(),
        }
    }
}

impl fmt::Display for NavigationKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.location_key, self.view_id)
    }
}

/// Everything a message list needs to come back exactly where it was left.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationSnapshot {
    pub items: Vec<Item>,
    pub hit_top: bool,
    pub hit_bottom: bool,
    /// Single-use; cleared by `consume_scroll_offset`.
    pub scroll_offset: Option<f64>,
}

#[derive(Serialize, Deserialize)]
struct StoredSnapshot {
    version: u32,
    snapshot: NavigationSnapshot,
}

fn encode(key: &NavigationKey, snapshot: &NavigationSnapshot) -> StorageResult<String> {
    let stored = StoredSnapshot {
        version: SNAPSHOT_VERSION,
        snapshot: snapshot.clone(),
    };
    serde_json::to_string(&stored).context(EncodeSnapshotSnafu {
        stage: "navigation-encode",
        key: key.to_string(),
    })
}

fn decode(key: &NavigationKey, raw: &str) -> Option<NavigationSnapshot> {
    match serde_json::from_str::<StoredSnapshot>(raw) {
        Ok(stored) if stored.version == SNAPSHOT_VERSION => Some(stored.snapshot),
        Ok(stored) => {
            tracing::warn!(
                %key,
                version = stored.version,
                expected = SNAPSHOT_VERSION,
                "ignoring navigation snapshot from another version"
            );
            None
        }
        Err(error) => {
            tracing::warn!(%key, %error, "ignoring corrupted navigation snapshot");
            None
        }
    }
}

/// Process-local snapshot cache, one encoded entry per key.
#[derive(Debug, Default)]
pub struct InMemoryNavigationCache {
    entries: Mutex<HashMap<NavigationKey, String>>,
}

impl InMemoryNavigationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.lock("navigation-len")?.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(
        &self,
        stage: &'static str,
    ) -> StorageResult<std::sync::MutexGuard<'_, HashMap<NavigationKey, String>>> {
        self.entries.lock().ok().ok_or_else(|| {
            LockPoisonedSnafu {
                stage,
                store: "navigation cache",
            }
            .build()
        })
    }

    #[cfg(test)]
    fn insert_raw(&self, key: NavigationKey, raw: &str) {
        self.entries.lock().unwrap().insert(key, raw.to_string());
    }
}

impl NavigationStateCache for InMemoryNavigationCache {
    fn save(&self, key: &NavigationKey, snapshot: &NavigationSnapshot) -> StorageResult<()> {
        let encoded = encode(key, snapshot)?;
        self.lock("navigation-save")?.insert(key.clone(), encoded);
        tracing::debug!(
            %key,
            items = snapshot.items.len(),
            hit_top = snapshot.hit_top,
            hit_bottom = snapshot.hit_bottom,
            scroll_offset = ?snapshot.scroll_offset,
            "saved navigation snapshot"
        );
        Ok(())
    }

    fn load(&self, key: &NavigationKey) -> StorageResult<Option<NavigationSnapshot>> {
        let entries = self.lock("navigation-load")?;
        Ok(entries.get(key).and_then(|raw| decode(key, raw)))
    }

    fn consume_scroll_offset(&self, key: &NavigationKey) -> StorageResult<()> {
        let mut entries = self.lock("navigation-consume")?;
        let Some(mut snapshot) = entries.get(key).and_then(|raw| decode(key, raw)) else {
            return Ok(());
        };
        if snapshot.scroll_offset.take().is_some() {
            let encoded = encode(key, &snapshot)?;
            entries.insert(key.clone(), encoded);
            tracing::debug!(%key, "consumed navigation scroll offset");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dmview_api::{ItemId, ParticipantLeave, Timestamp};
    use pretty_assertions::assert_eq;

    use super::*;

    fn snapshot(offset: Option<f64>) -> NavigationSnapshot {
        NavigationSnapshot {
            items: vec![Item::ParticipantLeave(ParticipantLeave {
                id: ItemId::new("7leave"),
                time: Timestamp::new("2020-01-01T00:00:00.000Z"),
                participant: "7".into(),
                conversation: "group".into(),
            })],
            hit_top: true,
            hit_bottom: false,
            scroll_offset: offset,
        }
    }

    #[test]
    fn missing_key_is_a_miss() {
        let cache = InMemoryNavigationCache::new();
        let key = NavigationKey::new("abc", "messages");
        assert_eq!(cache.load(&key).unwrap(), None);
        assert_eq!(cache.take_for_mount(&key).unwrap(), None);
    }

    #[test]
    fn save_overwrites_previous_entry() {
        let cache = InMemoryNavigationCache::new();
        let key = NavigationKey::new("abc", "messages");
        cache.save(&key, &snapshot(Some(10.0))).unwrap();
        cache.save(&key, &snapshot(Some(250.0))).unwrap();

        assert_eq!(cache.len().unwrap(), 1);
        assert_eq!(cache.load(&key).unwrap(), Some(snapshot(Some(250.0))));
    }

    #[test]
    fn scroll_offset_is_single_use() {
        let cache = InMemoryNavigationCache::new();
        let key = NavigationKey::new("abc", "messages");
        cache.save(&key, &snapshot(Some(480.0))).unwrap();

        let first = cache.take_for_mount(&key).unwrap().unwrap();
        assert_eq!(first.scroll_offset, Some(480.0));

        let second = cache.take_for_mount(&key).unwrap().unwrap();
        assert_eq!(second.scroll_offset, None);
        assert_eq!(second.items, first.items);
        assert!(second.hit_top);
    }

    #[test]
    fn views_at_one_location_are_independent() {
        let cache = InMemoryNavigationCache::new();
        let left = NavigationKey::new("abc", "messages");
        let right = NavigationKey::new("abc", "search");
        cache.save(&left, &snapshot(Some(1.0))).unwrap();

        assert_eq!(cache.load(&right).unwrap(), None);
        cache.consume_scroll_offset(&right).unwrap();
        assert_eq!(cache.load(&left).unwrap(), Some(snapshot(Some(1.0))));
    }

    #[test]
    fn corrupted_or_foreign_entries_read_as_misses() {
        let cache = InMemoryNavigationCache::new();
        let garbage = NavigationKey::new("abc", "garbage");
        let stale = NavigationKey::new("abc", "stale");
        cache.insert_raw(garbage.clone(), "{not json");
        cache.insert_raw(
            stale.clone(),
            r#"{"version":0,"snapshot":{"items":[],"hit_top":false,"hit_bottom":false,"scroll_offset":null}}"#,
        );

        assert_eq!(cache.load(&garbage).unwrap(), None);
        assert_eq!(cache.load(&stale).unwrap(), None);
        cache.consume_scroll_offset(&garbage).unwrap();
    }
}
