//! Plain-text rendering of archive data for the terminal.

use dmview_api::{
    Conversation, ConversationKind, GlobalStats, Item, NameUpdate, Participant, Timestamp, User,
    UserId, UserSummary,
};
use dmview_scroll::MessageRow;
use dmview_storage::AppStore;

const CONTENT_INDENT: &str = "    ";

/// `2021-03-04 17:05` in UTC, or the raw string when it does not parse.
pub fn format_time(time: &Timestamp) -> String {
    match time.to_datetime() {
        Some(parsed) => parsed.format("%Y-%m-%d %H:%M").to_string(),
        None => time.to_string(),
    }
}

fn format_optional_time(time: Option<&Timestamp>) -> String {
    time.map(format_time).unwrap_or_else(|| "?".to_string())
}

pub fn user_label(store: &AppStore, id: &UserId) -> String {
    match store.user(id) {
        Some(user) => user.label(),
        None => format!("user {id}"),
    }
}

pub fn conversation_title(conversation: &Conversation) -> String {
    match conversation.kind {
        ConversationKind::Group if !conversation.name.is_empty() => conversation.name.clone(),
        ConversationKind::Group => format!("Group {}", conversation.id),
        ConversationKind::Individual => match &conversation.other_person {
            Some(person) => person.label(),
            None => format!("Conversation {}", conversation.id),
        },
    }
}

pub fn conversation_line(conversation: &Conversation) -> String {
    format!(
        "{:<24} {:<40} {:>7} messages  {} .. {}",
        conversation.id.as_str(),
        conversation_title(conversation),
        conversation.number_of_messages,
        format_optional_time(conversation.first_time.as_ref()),
        format_optional_time(conversation.last_time.as_ref()),
    )
}

pub fn conversation_detail(conversation: &Conversation) -> Vec<String> {
    let mut lines = vec![
        conversation_title(conversation),
        format!("id: {}", conversation.id),
        format!(
            "messages: {} ({} from you)",
            conversation.number_of_messages, conversation.messages_from_you
        ),
        format!(
            "active: {} .. {}",
            format_optional_time(conversation.first_time.as_ref()),
            format_optional_time(conversation.last_time.as_ref())
        ),
    ];
    if conversation.kind == ConversationKind::Group {
        lines.push(format!(
            "participants: {}, name changes: {}",
            conversation.num_participants, conversation.num_name_updates
        ));
        if let Some(added_by) = &conversation.added_by {
            lines.push(format!("added by: {}", added_by.label()));
        }
    }
    if !conversation.notes.is_empty() {
        lines.push(format!("notes: {}", conversation.notes));
    }
    lines
}

pub fn user_line(user: &UserSummary) -> String {
    format!("{:<24} {}", user.id.as_str(), user.label())
}

pub fn participant_line(participant: &Participant) -> String {
    let mut line = format!(
        "{} - {} messages",
        user_line(&participant.summary),
        participant.messages_in_conversation
    );
    if let Some(left) = &participant.leave_time {
        line.push_str(&format!(", left {}", format_time(left)));
    }
    line
}

pub fn user_detail(user: &User) -> Vec<String> {
    let mut lines = vec![
        user.summary.label(),
        format!("id: {}", user.summary.id),
        format!("messages: {}", user.number_of_messages),
        format!(
            "seen: {} .. {}",
            format_optional_time(user.first_appearance.as_ref()),
            format_optional_time(user.last_appearance.as_ref())
        ),
    ];
    if !user.bio.is_empty() {
        lines.push(format!("bio: {}", user.bio));
    }
    if !user.notes.is_empty() {
        lines.push(format!("notes: {}", user.notes));
    }
    lines
}

pub fn name_update_line(store: &AppStore, update: &NameUpdate) -> String {
    format!(
        "[{}] {} renamed the conversation to \"{}\"",
        format_time(&update.update_time),
        user_label(store, &update.initiator),
        update.new_name
    )
}

pub fn stats_lines(stats: &GlobalStats) -> Vec<String> {
    vec![
        format!("conversations: {}", stats.number_of_conversations),
        format!("users: {}", stats.number_of_users),
        format!("messages: {}", stats.number_of_messages),
        format!(
            "range: {} .. {}",
            format_optional_time(stats.earliest_message.as_ref()),
            format_optional_time(stats.latest_message.as_ref())
        ),
    ]
}

/// Thread rows as text; grouped rows skip the attribution line.
pub fn row_lines(store: &AppStore, rows: &[MessageRow]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() * 2);
    for row in rows {
        match &row.item {
            Item::Message(message) => {
                if !row.grouped_with_previous {
                    lines.push(format!(
                        "[{}] {}",
                        format_time(&message.sent_time),
                        user_label(store, &message.sender)
                    ));
                }
                for line in message.content.lines() {
                    lines.push(format!("{CONTENT_INDENT}{line}"));
                }
                for media in &message.media {
                    lines.push(format!("{CONTENT_INDENT}[{}] {}", media.kind, media.src));
                }
                if !message.reactions.is_empty() {
                    let emotions = message
                        .reactions
                        .iter()
                        .map(|reaction| reaction.emotion.as_str())
                        .collect::<Vec<_>>();
                    lines.push(format!("{CONTENT_INDENT}({})", emotions.join(" ")));
                }
            }
            Item::NameUpdate(update) => lines.push(format!("-- {} --", name_update_line(store, update))),
            Item::ParticipantJoin(join) => lines.push(format!(
                "-- [{}] {} added {} --",
                format_time(&join.time),
                user_label(store, &join.added_by),
                user_label(store, &join.participant)
            )),
            Item::ParticipantLeave(leave) => lines.push(format!(
                "-- [{}] {} left --",
                format_time(&leave.time),
                user_label(store, &leave.participant)
            )),
        }
    }
    lines
}
