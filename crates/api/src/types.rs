use serde::{Deserialize, Serialize};

use super::ids::{ConversationId, ItemId, MediaId, UserId};
use super::time::Timestamp;

/// Maximum nickname length accepted by `POST /api/user/nickname`.
pub const NICKNAME_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub id: MediaId,
    #[serde(rename = "type")]
    pub kind: String,
    pub src: String,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: i64,
    pub emotion: String,
    pub creation_time: Timestamp,
    pub creator: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: ItemId,
    pub conversation: ConversationId,
    pub sender: UserId,
    pub sent_time: Timestamp,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub html_content: String,
    #[serde(default)]
    pub media: Vec<Media>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameUpdate {
    pub id: ItemId,
    pub update_time: Timestamp,
    pub initiator: UserId,
    pub new_name: String,
    pub conversation: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantJoin {
    pub id: ItemId,
    pub time: Timestamp,
    pub participant: UserId,
    pub added_by: UserId,
    pub conversation: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantLeave {
    pub id: ItemId,
    pub time: Timestamp,
    pub participant: UserId,
    pub conversation: ConversationId,
}

/// One entry in the flow of a conversation, discriminated by the server's `schema` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum Item {
    Message(Message),
    NameUpdate(NameUpdate),
    ParticipantJoin(ParticipantJoin),
    ParticipantLeave(ParticipantLeave),
}

impl Item {
    pub fn id(&self) -> &ItemId {
        match self {
            Self::Message(message) => &message.id,
            Self::NameUpdate(update) => &update.id,
            Self::ParticipantJoin(join) => &join.id,
            Self::ParticipantLeave(leave) => &leave.id,
        }
    }

    /// The single time field this item is ordered by.
    pub fn time(&self) -> &Timestamp {
        match self {
            Self::Message(message) => &message.sent_time,
            Self::NameUpdate(update) => &update.update_time,
            Self::ParticipantJoin(join) => &join.time,
            Self::ParticipantLeave(leave) => &leave.time,
        }
    }

    pub fn conversation(&self) -> &ConversationId {
        match self {
            Self::Message(message) => &message.conversation,
            Self::NameUpdate(update) => &update.conversation,
            Self::ParticipantJoin(join) => &join.conversation,
            Self::ParticipantLeave(leave) => &leave.conversation,
        }
    }

    /// Every user this item references, sender first, without duplicates.
    pub fn user_ids(&self) -> Vec<&UserId> {
        let mut ids: Vec<&UserId> = match self {
            Self::Message(message) => std::iter::once(&message.sender)
                .chain(message.reactions.iter().map(|reaction| &reaction.creator))
                .collect(),
            Self::NameUpdate(update) => vec![&update.initiator],
            Self::ParticipantJoin(join) => vec![&join.participant, &join.added_by],
            Self::ParticipantLeave(leave) => vec![&leave.participant],
        };
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        ids
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::NameUpdate(_) | Self::ParticipantJoin(_) | Self::ParticipantLeave(_) => None,
        }
    }

    pub fn is_message(&self) -> bool {
        self.as_message().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub loaded_full_data: bool,
    #[serde(default)]
    pub is_main_user: bool,
}

impl UserSummary {
    /// "display name (@handle)", prefixed by the nickname when one is set.
    pub fn label(&self) -> String {
        let base = format!("{} (@{})", self.display_name, self.handle);
        if self.nickname.is_empty() {
            base
        } else {
            format!("{} - {base}", self.nickname)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub summary: UserSummary,
    #[serde(default)]
    pub number_of_messages: u64,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub first_appearance: Option<Timestamp>,
    #[serde(default)]
    pub last_appearance: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub conversation: ConversationId,
    #[serde(default)]
    pub messages_in_conversation: u64,
    #[serde(default)]
    pub join_time: Option<Timestamp>,
    #[serde(default)]
    pub leave_time: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Group,
    Individual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    #[serde(default)]
    pub number_of_messages: u64,
    #[serde(default)]
    pub messages_from_you: u64,
    #[serde(default)]
    pub first_time: Option<Timestamp>,
    #[serde(default)]
    pub last_time: Option<Timestamp>,
    #[serde(default)]
    pub num_participants: u64,
    #[serde(default)]
    pub num_name_updates: u64,
    #[serde(default)]
    pub created_by_me: bool,
    #[serde(default)]
    pub other_person: Option<UserSummary>,
    #[serde(default)]
    pub added_by: Option<UserSummary>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStats {
    pub number_of_conversations: u64,
    pub number_of_users: u64,
    pub number_of_messages: u64,
    #[serde(default)]
    pub earliest_message: Option<Timestamp>,
    #[serde(default)]
    pub latest_message: Option<Timestamp>,
}

/// The `{results, users?}` envelope shared by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub users: Vec<UserSummary>,
}

/// Wire shape of a message page before per-item validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawMessageEnvelope {
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub users: Vec<UserSummary>,
    #[serde(default, alias = "conversation")]
    pub conversations: Vec<Conversation>,
}

/// A parsed page of messagelike items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessagePage {
    /// Items that parsed, in server order (ascending time).
    pub items: Vec<Item>,
    pub users: Vec<UserSummary>,
    pub conversations: Vec<Conversation>,
    /// Entry count the server sent, including entries that failed to parse.
    pub raw_len: usize,
    pub skipped: usize,
}

impl MessagePage {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            raw_len: items.len(),
            items,
            ..Self::default()
        }
    }

    pub fn with_users(mut self, users: Vec<UserSummary>) -> Self {
        self.users = users;
        self
    }

    /// Zero server entries is the authoritative exhaustion signal for a direction.
    pub fn is_exhausted(&self) -> bool {
        self.raw_len == 0
    }

    pub fn message_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_message()).count()
    }

    pub(crate) fn from_envelope(envelope: RawMessageEnvelope, endpoint: &str) -> Self {
        let raw_len = envelope.results.len();
        let mut items = Vec::with_capacity(raw_len);
        let mut skipped = 0;

        for (index, value) in envelope.results.into_iter().enumerate() {
            match serde_json::from_value::<Item>(value) {
                Ok(item) => items.push(item),
                Err(error) => {
                    // One bad row must not take the rest of the page down with it.
                    skipped += 1;
                    tracing::warn!(endpoint, index, %error, "skipping malformed item");
                }
            }
        }

        Self {
            items,
            users: envelope.users,
            conversations: envelope.conversations,
            raw_len,
            skipped,
        }
    }
}
