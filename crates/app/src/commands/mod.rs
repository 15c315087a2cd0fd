pub mod edit;
pub mod lists;
pub mod render;
pub mod stats;
pub mod thread;

use std::sync::Arc;

use dmview_api::ArchiveClient;
use dmview_storage::AppStore;
use snafu::ResultExt;

use crate::cli::{Cli, Command};
use crate::error::{ApiSnafu, CliResult};
use crate::settings::{SettingsStore, ViewerSettings};

/// Everything a command needs to talk to the archive.
pub struct Context {
    pub client: ArchiveClient,
    pub store: Arc<AppStore>,
    pub settings: ViewerSettings,
}

impl Context {
    pub fn new(settings: ViewerSettings) -> CliResult<Self> {
        let client = ArchiveClient::with_cookie(settings.base_url.clone(), settings.cookie())
            .context(ApiSnafu {
                stage: "build-archive-client",
            })?;
        Ok(Self {
            client,
            store: Arc::new(AppStore::default()),
            settings,
        })
    }
}

/// Settings from disk and environment with the command-line overrides on top.
pub fn effective_settings(cli: &Cli, settings_store: &SettingsStore) -> ViewerSettings {
    let mut settings = ViewerSettings::clone(&settings_store.settings());
    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(cookie) = &cli.cookie {
        settings.cookie = cookie.clone();
    }
    settings.normalized()
}

/// Runs one command and returns the lines to print.
pub async fn run(cli: Cli) -> CliResult<Vec<String>> {
    let settings_store = match &cli.config {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::load(),
    };
    let settings = effective_settings(&cli, &settings_store);
    tracing::debug!(base_url = %settings.base_url, "resolved settings");

    if let Command::Configure(args) = &cli.command {
        return edit::configure(&settings_store, settings, args);
    }

    let context = Context::new(settings)?;
    match cli.command {
        Command::Conversations {
            order,
            types,
            with_user,
            pages,
        } => lists::conversations(&context, order.into(), types.into(), with_user, pages).await,
        Command::Conversation { id } => lists::conversation(&context, id.into()).await,
        Command::Names {
            conversation,
            order,
            pages,
        } => lists::names(&context, conversation.into(), order.into(), pages).await,
        Command::Participants {
            conversation,
            pages,
        } => lists::participants(&context, conversation.map(Into::into), pages).await,
        Command::User { id, conversations } => {
            lists::user(&context, id.into(), conversations).await
        }
        Command::Messages(args) => thread::messages(&context, &args).await,
        Command::Message { id } => thread::single(&context, id.into()).await,
        Command::Random => thread::random(&context).await,
        Command::Stats => stats::overview(&context).await,
        Command::Nickname { user, nickname } => {
            edit::nickname(&context, user.into(), &nickname).await
        }
        Command::Notes { target } => edit::notes(&context, target).await,
        Command::Configure(_) => Ok(Vec::new()),
    }
}
