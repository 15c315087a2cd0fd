use dmview_api::{ConversationId, UserId};
use snafu::ResultExt;

use super::Context;
use crate::cli::{ConfigureArgs, NotesTarget};
use crate::error::{ApiSnafu, CliResult, SettingsSnafu};
use crate::settings::{SettingsStore, ViewerSettings};

pub async fn nickname(context: &Context, user: UserId, nickname: &str) -> CliResult<Vec<String>> {
    let nickname = nickname.trim();
    context
        .client
        .set_user_nickname(&user, nickname)
        .await
        .context(ApiSnafu {
            stage: "set-user-nickname",
        })?;

    if !context.store.set_user_nickname(&user, nickname) {
        tracing::debug!(%user, "nickname saved for a user not loaded locally");
    }
    tracing::info!(%user, "nickname updated");
    Ok(vec![format!("nickname for user {user} set to \"{nickname}\"")])
}

pub async fn notes(context: &Context, target: NotesTarget) -> CliResult<Vec<String>> {
    match target {
        NotesTarget::User { id, notes } => {
            let id = UserId::from(id);
            context
                .client
                .set_user_notes(&id, &notes)
                .await
                .context(ApiSnafu {
                    stage: "set-user-notes",
                })?;
            Ok(vec![format!("notes saved for user {id}")])
        }
        NotesTarget::Conversation { id, notes } => {
            let id = ConversationId::from(id);
            context
                .client
                .set_conversation_notes(&id, &notes)
                .await
                .context(ApiSnafu {
                    stage: "set-conversation-notes",
                })?;
            Ok(vec![format!("notes saved for conversation {id}")])
        }
    }
}

pub fn apply_configure(mut settings: ViewerSettings, args: &ConfigureArgs) -> ViewerSettings {
    if let Some(max_window) = args.max_window {
        settings.max_window = max_window;
    }
    if let Some(edge_threshold_px) = args.edge_threshold_px {
        settings.edge_threshold_px = edge_threshold_px;
    }
    if let Some(short_page) = args.short_page {
        settings.short_page = Some(short_page);
    }
    if let Some(group_gap_seconds) = args.group_gap_seconds {
        settings.group_gap_seconds = group_gap_seconds;
    }
    if let Some(viewport_height) = args.viewport_height {
        settings.viewport_height = viewport_height;
    }
    if let Some(content_width) = args.content_width {
        settings.content_width = content_width;
    }
    settings.normalized()
}

pub fn configure(
    settings_store: &SettingsStore,
    settings: ViewerSettings,
    args: &ConfigureArgs,
) -> CliResult<Vec<String>> {
    let settings = apply_configure(settings, args);
    settings_store
        .update(settings)
        .context(SettingsSnafu {
            stage: "configure",
        })?;

    let saved = settings_store.settings();
    Ok(vec![
        format!("saved settings to {}", settings_store.config_path().display()),
        format!("base_url: {}", saved.base_url),
        format!("max_window: {}", saved.max_window),
        format!("edge_threshold_px: {}", saved.edge_threshold_px),
        format!(
            "short_page: {}",
            saved
                .short_page
                .map(|size| size.to_string())
                .unwrap_or_else(|| "off".to_string())
        ),
        format!("group_gap_seconds: {}", saved.group_gap_seconds),
    ])
}
