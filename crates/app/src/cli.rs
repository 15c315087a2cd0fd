use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use dmview_api::{ConversationOrder, ConversationTypes, NameOrder};
use dmview_scroll::Direction;

/// Browse a direct-message archive server from the terminal.
#[derive(Debug, Parser)]
#[command(name = "dmview", version)]
pub struct Cli {
    /// Archive server to talk to, overriding the configured one.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Cookie header sent with every request, e.g. `Authorization=...`.
    #[arg(long, global = true)]
    pub cookie: Option<String>,

    /// Settings file to read instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List conversations.
    Conversations {
        #[arg(long, value_enum, default_value_t)]
        order: OrderArg,
        #[arg(long, value_enum, default_value_t)]
        types: TypesArg,
        /// Only conversations this user takes part in.
        #[arg(long)]
        with_user: Option<String>,
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Show one conversation.
    Conversation { id: String },

    /// List the name changes of a group conversation.
    Names {
        conversation: String,
        #[arg(long, value_enum, default_value_t)]
        order: NameOrderArg,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// List users, or the participants of one conversation.
    Participants {
        conversation: Option<String>,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Show one user.
    User {
        id: String,
        /// Also list the conversations they take part in.
        #[arg(long)]
        conversations: bool,
    },

    /// Read a message thread, scrolling through it page by page.
    Messages(MessagesArgs),

    /// Show a single message.
    Message { id: String },

    /// Show a random sample of messages.
    Random,

    /// Show archive-wide totals.
    Stats,

    /// Set the nickname shown for a user.
    Nickname { user: String, nickname: String },

    /// Set notes on a user or a conversation.
    Notes {
        #[command(subcommand)]
        target: NotesTarget,
    },

    /// Save the connection and viewer options to the settings file.
    Configure(ConfigureArgs),
}

#[derive(Debug, clap::Args)]
pub struct MessagesArgs {
    #[arg(long, conflicts_with = "user")]
    pub conversation: Option<String>,

    /// Messages sent by this user across every conversation.
    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    /// `beginning`, `end`, a date (`2021-03-04`), or an RFC 3339 timestamp.
    #[arg(long, default_value = "end")]
    pub start: String,

    #[arg(long, value_enum, default_value_t = ScrollArg::Up)]
    pub direction: ScrollArg,

    /// How many viewport heights to scroll after the first page.
    #[arg(long, default_value_t = 3)]
    pub steps: usize,

    /// Leave the thread and come back, showing the restored position.
    #[arg(long)]
    pub revisit: bool,
}

#[derive(Debug, Subcommand)]
pub enum NotesTarget {
    User { id: String, notes: String },
    Conversation { id: String, notes: String },
}

#[derive(Debug, clap::Args)]
pub struct ConfigureArgs {
    #[arg(long)]
    pub max_window: Option<usize>,
    #[arg(long)]
    pub edge_threshold_px: Option<f64>,
    /// Messages per full server page; 0 disables short-page detection.
    #[arg(long)]
    pub short_page: Option<usize>,
    #[arg(long)]
    pub group_gap_seconds: Option<i64>,
    #[arg(long)]
    pub viewport_height: Option<f64>,
    #[arg(long)]
    pub content_width: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OrderArg {
    #[default]
    Oldest,
    Newest,
    MostUsed,
    MostUsedByMe,
}

impl From<OrderArg> for ConversationOrder {
    fn from(value: OrderArg) -> Self {
        match value {
            OrderArg::Oldest => Self::Oldest,
            OrderArg::Newest => Self::Newest,
            OrderArg::MostUsed => Self::MostUsed,
            OrderArg::MostUsedByMe => Self::MostUsedByMe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TypesArg {
    #[default]
    All,
    Group,
    Individual,
}

impl From<TypesArg> for ConversationTypes {
    fn from(value: TypesArg) -> Self {
        Self {
            group: value != TypesArg::Individual,
            individual: value != TypesArg::Group,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NameOrderArg {
    #[default]
    Oldest,
    Newest,
}

impl From<NameOrderArg> for NameOrder {
    fn from(value: NameOrderArg) -> Self {
        match value {
            NameOrderArg::Oldest => Self::Oldest,
            NameOrderArg::Newest => Self::Newest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScrollArg {
    Up,
    Down,
}

impl From<ScrollArg> for Direction {
    fn from(value: ScrollArg) -> Self {
        match value {
            ScrollArg::Up => Self::Up,
            ScrollArg::Down => Self::Down,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn messages_defaults_to_the_end_scrolling_up() {
        let cli = Cli::parse_from(["dmview", "messages", "--conversation", "1-2"]);
        let Command::Messages(args) = cli.command else {
            panic!("expected messages command");
        };
        assert_eq!(args.conversation.as_deref(), Some("1-2"));
        assert_eq!(args.start, "end");
        assert_eq!(args.direction, ScrollArg::Up);
        assert_eq!(args.steps, 3);
        assert!(!args.revisit);
    }

    #[test]
    fn conversation_and_user_selectors_conflict() {
        let result = Cli::try_parse_from([
            "dmview",
            "messages",
            "--conversation",
            "1-2",
            "--user",
            "3",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn global_connection_flags_follow_the_subcommand() {
        let cli = Cli::parse_from(["dmview", "stats", "--base-url", "http://archive:9000"]);
        assert_eq!(cli.base_url.as_deref(), Some("http://archive:9000"));
        assert!(matches!(cli.command, Command::Stats));
    }

    #[test]
    fn type_filter_maps_to_server_parameter() {
        assert_eq!(ConversationTypes::from(TypesArg::All).as_param(), "group-individual");
        assert_eq!(ConversationTypes::from(TypesArg::Group).as_param(), "group");
        assert_eq!(
            ConversationTypes::from(TypesArg::Individual).as_param(),
            "individual"
        );
    }
}
