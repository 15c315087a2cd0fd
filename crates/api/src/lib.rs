pub mod client;
pub mod error;
pub mod ids;
pub mod query;
pub mod time;
pub mod types;

use std::future::Future;
use std::pin::Pin;

pub use client::ArchiveClient;
pub use error::{ApiError, ApiResult};
pub use ids::{ConversationId, ItemId, MediaId, UserId};
pub use query::{
    Bound, ConversationOrder, ConversationTypes, MessageQuery, NameOrder, Position, Selector,
};
pub use time::Timestamp;
pub use types::{
    Conversation, ConversationKind, GlobalStats, Item, Media, Message, MessagePage,
    NICKNAME_MAX_CHARS, NameUpdate, Page, Participant, ParticipantJoin, ParticipantLeave,
    Reaction, User, UserSummary,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Anything that can serve one page of messagelike items for a query.
pub trait MessageSource: Send + Sync {
    fn fetch_messages<'a>(
        &'a self,
        query: &'a MessageQuery,
    ) -> BoxFuture<'a, ApiResult<MessagePage>>;
}
