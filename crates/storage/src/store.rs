use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use dmview_api::{Conversation, ConversationId, GlobalStats, UserId, UserSummary};

use super::navigation::InMemoryNavigationCache;
use super::NavigationStateCache;

type UserMap = HashMap<UserId, UserSummary>;
type ConversationMap = HashMap<ConversationId, Conversation>;

/// Shared lookup tables every view reads while rendering.
///
/// Maps are copy-on-write: readers grab the current `Arc` without locking and merges
/// publish a new map. Later records for an id replace earlier ones.
pub struct AppStore {
    users: ArcSwap<UserMap>,
    conversations: ArcSwap<ConversationMap>,
    stats: ArcSwapOption<GlobalStats>,
    page_state: Arc<dyn NavigationStateCache>,
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryNavigationCache::new()))
    }
}

impl AppStore {
    pub fn new(page_state: Arc<dyn NavigationStateCache>) -> Self {
        Self {
            users: ArcSwap::from_pointee(UserMap::new()),
            conversations: ArcSwap::from_pointee(ConversationMap::new()),
            stats: ArcSwapOption::empty(),
            page_state,
        }
    }

    pub fn merge_users(&self, incoming: &[UserSummary]) {
        if incoming.is_empty() {
            return;
        }
        self.users.rcu(|current| {
            let mut next = UserMap::clone(current);
            for user in incoming {
                next.insert(user.id.clone(), user.clone());
            }
            next
        });
        tracing::trace!(merged = incoming.len(), "merged users into store");
    }

    pub fn merge_conversations(&self, incoming: &[Conversation]) {
        if incoming.is_empty() {
            return;
        }
        self.conversations.rcu(|current| {
            let mut next = ConversationMap::clone(current);
            for conversation in incoming {
                next.insert(conversation.id.clone(), conversation.clone());
            }
            next
        });
        tracing::trace!(merged = incoming.len(), "merged conversations into store");
    }

    /// Applies a nickname change locally once the server accepted it.
    pub fn set_user_nickname(&self, id: &UserId, nickname: &str) -> bool {
        let mut updated = false;
        self.users.rcu(|current| {
            let mut next = UserMap::clone(current);
            updated = match next.get_mut(id) {
                Some(user) => {
                    user.nickname = nickname.to_string();
                    true
                }
                None => false,
            };
            next
        });
        updated
    }

    pub fn user(&self, id: &UserId) -> Option<UserSummary> {
        self.users.load().get(id).cloned()
    }

    pub fn users(&self) -> Arc<UserMap> {
        self.users.load_full()
    }

    pub fn conversation(&self, id: &ConversationId) -> Option<Conversation> {
        self.conversations.load().get(id).cloned()
    }

    pub fn conversations(&self) -> Arc<ConversationMap> {
        self.conversations.load_full()
    }

    pub fn set_stats(&self, stats: GlobalStats) {
        self.stats.store(Some(Arc::new(stats)));
    }

    pub fn stats(&self) -> Option<Arc<GlobalStats>> {
        self.stats.load_full()
    }

    pub fn page_state(&self) -> &Arc<dyn NavigationStateCache> {
        &self.page_state
    }
}

#[cfg(test)]
mod tests {
    use dmview_api::ConversationKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn user(id: &str, handle: &str) -> UserSummary {
        UserSummary {
            id: UserId::new(id),
            handle: handle.to_string(),
            display_name: handle.to_uppercase(),
            ..UserSummary::default()
        }
    }

    #[test]
    fn later_user_records_replace_earlier_ones() {
        let store = AppStore::default();
        store.merge_users(&[user("1", "old"), user("2", "two")]);
        let before = store.users();

        store.merge_users(&[user("1", "new")]);

        assert_eq!(store.user(&UserId::new("1")).map(|u| u.handle), Some("new".to_string()));
        assert_eq!(store.users().len(), 2);
        assert_eq!(before.get(&UserId::new("1")).map(|u| u.handle.as_str()), Some("old"));
    }

    #[test]
    fn nickname_updates_only_known_users() {
        let store = AppStore::default();
        store.merge_users(&[user("1", "one")]);

        assert!(store.set_user_nickname(&UserId::new("1"), "pal"));
        assert!(!store.set_user_nickname(&UserId::new("9"), "ghost"));
        assert_eq!(
            store.user(&UserId::new("1")).map(|u| u.nickname),
            Some("pal".to_string())
        );
    }

    #[test]
    fn conversations_and_stats_are_shared() {
        let store = AppStore::default();
        store.merge_conversations(&[Conversation {
            id: ConversationId::new("1-2"),
            kind: ConversationKind::Individual,
            number_of_messages: 3,
            messages_from_you: 1,
            first_time: None,
            last_time: None,
            num_participants: 2,
            num_name_updates: 0,
            created_by_me: false,
            other_person: None,
            added_by: None,
            name: String::new(),
            image_url: String::new(),
            notes: String::new(),
        }]);
        assert!(store.stats().is_none());

        store.set_stats(GlobalStats {
            number_of_conversations: 1,
            number_of_users: 2,
            number_of_messages: 3,
            earliest_message: None,
            latest_message: None,
        });

        assert_eq!(
            store
                .conversation(&ConversationId::new("1-2"))
                .map(|c| c.number_of_messages),
            Some(3)
        );
        assert_eq!(store.stats().map(|s| s.number_of_messages), Some(3));
    }
}
