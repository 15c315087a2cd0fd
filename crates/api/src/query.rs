use super::ids::{ConversationId, UserId};
use super::time::Timestamp;

/// Which slice of the archive a message list reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    All,
    Conversation(ConversationId),
    User(UserId),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Bound {
    Time(Timestamp),
    End,
    Beginning,
}

impl Bound {
    fn as_param(&self) -> &str {
        match self {
            Self::Time(time) => time.as_str(),
            Self::End => "end",
            Self::Beginning => "beginning",
        }
    }
}

/// Where a page is cut relative to the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Position {
    /// Items strictly earlier than the bound.
    Before(Bound),
    /// Items strictly later than the bound.
    After(Bound),
    /// A page centered near the given time.
    At(Timestamp),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageQuery {
    pub selector: Selector,
    pub search: Option<String>,
    pub position: Position,
}

impl MessageQuery {
    pub fn new(selector: Selector, position: Position) -> Self {
        Self {
            selector,
            search: None,
            position,
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|term| !term.is_empty());
        self
    }

    /// Query-string pairs in the order the server expects: selector, search, position.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        match &self.selector {
            Selector::All => {}
            Selector::Conversation(id) => pairs.push(("conversation", id.to_string())),
            Selector::User(id) => pairs.push(("byuser", id.to_string())),
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        let (key, value) = match &self.position {
            Position::Before(bound) => ("before", bound.as_param()),
            Position::After(bound) => ("after", bound.as_param()),
            Position::At(time) => ("at", time.as_str()),
        };
        pairs.push((key, value.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConversationOrder {
    #[default]
    Oldest,
    Newest,
    MostUsed,
    MostUsedByMe,
}

impl ConversationOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Oldest => "oldest",
            Self::Newest => "newest",
            Self::MostUsed => "mostused",
            Self::MostUsedByMe => "mostusedbyme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversationTypes {
    pub group: bool,
    pub individual: bool,
}

impl Default for ConversationTypes {
    fn default() -> Self {
        Self {
            group: true,
            individual: true,
        }
    }
}

impl ConversationTypes {
    /// `group-individual`, `group`, `individual`, or empty.
    pub fn as_param(self) -> String {
        let mut parts = Vec::with_capacity(2);
        if self.group {
            parts.push("group");
        }
        if self.individual {
            parts.push("individual");
        }
        parts.join("-")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NameOrder {
    #[default]
    Oldest,
    Newest,
}

impl NameOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Oldest => "oldest",
            Self::Newest => "newest",
        }
    }
}
