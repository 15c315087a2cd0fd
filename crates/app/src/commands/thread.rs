use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use dmview_api::{
    ApiResult, BoxFuture, ItemId, MessagePage, MessageQuery, MessageSource, Selector, Timestamp,
};
use dmview_scroll::{
    Direction, EstimatedLayout, LayoutMetrics, MessageListController, MessageRow,
    NavigationHistory, StartingPlace, ThreadQuery,
};
use dmview_storage::AppStore;
use snafu::ResultExt;

use super::{Context, render};
use crate::cli::MessagesArgs;
use crate::error::{ApiSnafu, CliResult, ControllerSnafu, InvalidArgumentSnafu};
use crate::settings::ViewerSettings;

pub const THREAD_VIEW_ID: &str = "messages";

/// Upper bound on loads while settling one scroll position.
const MAX_LOADS_PER_SETTLE: usize = 16;

/// `beginning`, `end`, a calendar date (midnight UTC), or an RFC 3339 timestamp.
pub fn parse_start(raw: &str) -> CliResult<StartingPlace> {
    let trimmed = raw.trim();
    match trimmed {
        "" | "end" => return Ok(StartingPlace::End),
        "beginning" => return Ok(StartingPlace::Beginning),
        _ => {}
    }

    let candidate = Timestamp::new(trimmed);
    if let Some(parsed) = candidate.to_datetime() {
        return Ok(StartingPlace::At(Timestamp::from_datetime(parsed)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).map(|time| time.and_utc());
        if let Some(midnight) = midnight {
            return Ok(StartingPlace::At(Timestamp::from_datetime(midnight)));
        }
    }

    InvalidArgumentSnafu {
        stage: "parse-start",
        argument: "start",
        reason: format!("`{trimmed}` is not `beginning`, `end`, a date, or a timestamp"),
    }
    .fail()
}

/// Route-like path for a thread, used as the history location.
pub fn thread_path(thread: &ThreadQuery) -> String {
    let base = match &thread.selector {
        Selector::All => "/messages".to_string(),
        Selector::Conversation(id) => format!("/conversation/messages/{id}"),
        Selector::User(id) => format!("/user/messages/{id}"),
    };
    match &thread.search {
        Some(search) => format!("{base}?search={search}"),
        None => base,
    }
}

/// Counts fetches on their way to the real source.
pub struct CountingSource<'a, S: ?Sized> {
    inner: &'a S,
    fetches: AtomicUsize,
}

impl<'a, S: MessageSource + ?Sized> CountingSource<'a, S> {
    pub fn new(inner: &'a S) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl<S: MessageSource + ?Sized> MessageSource for CountingSource<'_, S> {
    fn fetch_messages<'a>(
        &'a self,
        query: &'a MessageQuery,
    ) -> BoxFuture<'a, ApiResult<MessagePage>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.inner.fetch_messages(query)
    }
}

/// How a thread looked once reading stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadOutcome {
    pub rows: Vec<MessageRow>,
    pub hit_top: bool,
    pub hit_bottom: bool,
    pub scroll_offset: f64,
    pub visible: Vec<ItemId>,
    pub fetches: usize,
    pub revisit: Option<RevisitOutcome>,
}

/// The thread as remounted after navigating away and back.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisitOutcome {
    pub items: usize,
    pub scroll_offset: f64,
    pub fetches: usize,
}

/// Simulated terminal viewport over a message list.
struct ThreadViewport {
    metrics: LayoutMetrics,
    offset: f64,
}

impl ThreadViewport {
    fn layout(&mut self, list: &MessageListController) -> EstimatedLayout {
        let layout = EstimatedLayout::measure(&list.rows(), self.metrics).scrolled_to(self.offset);
        self.offset = layout.scroll_offset();
        layout
    }

    /// Renders, applies any pending anchor, and loads until the list needs nothing more.
    async fn settle<S>(&mut self, list: &MessageListController, source: &S) -> CliResult<()>
    where
        S: MessageSource + ?Sized,
    {
        for _ in 0..MAX_LOADS_PER_SETTLE {
            let rendered = self.layout(list);
            if let Some(offset) = list.after_render(&rendered) {
                self.offset = offset;
            }

            let layout = self.layout(list);
            match list.check(source, &layout).await {
                Ok(Some(_)) => {}
                Ok(None) => return Ok(()),
                Err(error) if list.is_empty() => {
                    return Err(error).context(ControllerSnafu {
                        stage: "load-first-page",
                    });
                }
                Err(error) => {
                    tracing::warn!(%error, "page load failed, keeping what is loaded");
                    return Ok(());
                }
            }
        }
        let rendered = self.layout(list);
        if let Some(offset) = list.after_render(&rendered) {
            self.offset = offset;
        }
        tracing::debug!(limit = MAX_LOADS_PER_SETTLE, "stopped settling after load limit");
        Ok(())
    }

    fn scroll(&mut self, list: &MessageListController, direction: Direction) {
        let delta = match direction {
            Direction::Up => -self.metrics.viewport_height,
            Direction::Down => self.metrics.viewport_height,
        };
        self.offset += delta;
        let layout = self.layout(list);
        list.record_scroll_offset(layout.scroll_offset());
    }
}

/// Opens a thread, scrolls it `steps` viewport heights, and optionally leaves and
/// returns to it through navigation history.
pub async fn read_thread<S>(
    source: &S,
    store: Arc<AppStore>,
    settings: &ViewerSettings,
    thread: ThreadQuery,
    direction: Direction,
    steps: usize,
    revisit: bool,
) -> CliResult<ThreadOutcome>
where
    S: MessageSource + ?Sized,
{
    let source = CountingSource::new(source);
    let config = settings.controller_config();
    let history = NavigationHistory::new(thread_path(&thread));
    let mut viewport = ThreadViewport {
        metrics: settings.layout_metrics(),
        offset: 0.0,
    };

    let list = MessageListController::mount(
        thread.clone(),
        config,
        Arc::clone(&store),
        &history,
        THREAD_VIEW_ID,
    );
    viewport.settle(&list, &source).await?;
    for step in 0..steps {
        viewport.scroll(&list, direction);
        viewport.settle(&list, &source).await?;
        tracing::debug!(step, offset = viewport.offset, items = list.len(), "scrolled thread");
    }

    let layout = viewport.layout(&list);
    let visible = layout.visible().into_iter().cloned().collect();
    let fetches = source.fetches();
    let mut outcome = ThreadOutcome {
        rows: list.rows(),
        hit_top: list.hit_top(),
        hit_bottom: list.hit_bottom(),
        scroll_offset: layout.scroll_offset(),
        visible,
        fetches,
        revisit: None,
    };

    if revisit {
        list.record_scroll_offset(viewport.offset);
        history.push("/conversations");
        drop(list);
        history.back();

        let mut returning = ThreadViewport {
            metrics: settings.layout_metrics(),
            offset: 0.0,
        };
        let restored =
            MessageListController::mount(thread, config, store, &history, THREAD_VIEW_ID);
        returning.settle(&restored, &source).await?;
        outcome.revisit = Some(RevisitOutcome {
            items: restored.len(),
            scroll_offset: returning.offset,
            fetches: source.fetches() - fetches,
        });
    }

    Ok(outcome)
}

pub async fn messages(context: &Context, args: &MessagesArgs) -> CliResult<Vec<String>> {
    let selector = match (&args.conversation, &args.user) {
        (Some(conversation), _) => Selector::Conversation(conversation.as_str().into()),
        (None, Some(user)) => Selector::User(user.as_str().into()),
        (None, None) => Selector::All,
    };
    let thread = ThreadQuery::new(selector)
        .with_search(args.search.clone().filter(|search| !search.trim().is_empty()))
        .starting_at(parse_start(&args.start)?);

    let outcome = read_thread(
        &context.client,
        Arc::clone(&context.store),
        &context.settings,
        thread,
        args.direction.into(),
        args.steps,
        args.revisit,
    )
    .await?;
    Ok(thread_lines(&context.store, &outcome))
}

pub fn thread_lines(store: &AppStore, outcome: &ThreadOutcome) -> Vec<String> {
    let mut lines = render::row_lines(store, &outcome.rows);
    lines.push(String::new());
    lines.push(format!(
        "{} items loaded in {} requests; start {}, end {}",
        outcome.rows.len(),
        outcome.fetches,
        if outcome.hit_top { "reached" } else { "not reached" },
        if outcome.hit_bottom { "reached" } else { "not reached" },
    ));
    if let (Some(first), Some(last)) = (outcome.visible.first(), outcome.visible.last()) {
        lines.push(format!(
            "viewport at {:.0}px shows items {first} to {last}",
            outcome.scroll_offset
        ));
    }
    if let Some(revisit) = &outcome.revisit {
        lines.push(format!(
            "after navigating back: {} items restored at {:.0}px with {} new requests",
            revisit.items, revisit.scroll_offset, revisit.fetches
        ));
    }
    lines
}

pub async fn single(context: &Context, id: ItemId) -> CliResult<Vec<String>> {
    let page = context.client.message(&id).await.context(ApiSnafu {
        stage: "fetch-message",
    })?;
    Ok(page_lines(context, page))
}

pub async fn random(context: &Context) -> CliResult<Vec<String>> {
    let page = context.client.random_messages().await.context(ApiSnafu {
        stage: "fetch-random-messages",
    })?;
    Ok(page_lines(context, page))
}

/// Rows for a standalone page; every entry gets its own attribution.
pub fn page_lines(context: &Context, page: MessagePage) -> Vec<String> {
    context.store.merge_users(&page.users);
    context.store.merge_conversations(&page.conversations);
    if page.skipped > 0 {
        tracing::warn!(skipped = page.skipped, "page contained malformed items");
    }
    let rows = page
        .items
        .into_iter()
        .map(|item| MessageRow {
            item,
            grouped_with_previous: false,
        })
        .collect::<Vec<_>>();
    render::row_lines(&context.store, &rows)
}
