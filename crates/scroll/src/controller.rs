use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use dmview_api::{
    ApiResult, Bound, Item, ItemId, MessagePage, MessageQuery, MessageSource, Position, Selector,
};
use dmview_storage::{AppStore, NavigationKey, NavigationSnapshot, NavigationStateCache};
use snafu::ResultExt;

use super::anchor::{PositionProvider, ScrollAnchor, Viewport};
use super::error::{ControllerResult, FetchSnafu};
use super::grouping::{DEFAULT_GROUP_GAP_MILLIS, MessageRow, message_rows};
use super::history::{NavigationHistory, Subscription, Transition};
use super::window::{
    Direction, LoadRequest, PageApplied, PendingLoad, StartingPlace, WindowConfig, WindowItem,
    WindowedList,
};

/// Distance from an edge, in pixels, at which the next page is requested.
pub const DEFAULT_EDGE_THRESHOLD: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    pub window: WindowConfig,
    pub edge_threshold: f64,
    pub group_gap_millis: i64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            group_gap_millis: DEFAULT_GROUP_GAP_MILLIS,
        }
    }
}

/// Which messages a thread view shows and where it opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadQuery {
    pub selector: Selector,
    pub search: Option<String>,
    pub starting_place: StartingPlace,
}

impl ThreadQuery {
    pub fn new(selector: Selector) -> Self {
        Self {
            selector,
            search: None,
            starting_place: StartingPlace::default(),
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search;
        self
    }

    pub fn starting_at(mut self, place: StartingPlace) -> Self {
        self.starting_place = place;
        self
    }

    fn query_for(&self, request: &LoadRequest) -> MessageQuery {
        let position = match request {
            LoadRequest::Start(StartingPlace::Beginning) => Position::After(Bound::Beginning),
            LoadRequest::Start(StartingPlace::End) => Position::Before(Bound::End),
            LoadRequest::Start(StartingPlace::At(time)) => Position::At(time.clone()),
            LoadRequest::Page {
                direction: Direction::Up,
                cursor,
            } => Position::Before(Bound::Time(cursor.clone())),
            LoadRequest::Page {
                direction: Direction::Down,
                cursor,
            } => Position::After(Bound::Time(cursor.clone())),
        };
        MessageQuery::new(self.selector.clone(), position).with_search(self.search.clone())
    }
}

struct ControllerState {
    window: WindowedList<Item>,
    anchor: ScrollAnchor<ItemId>,
    last_scroll_offset: Option<f64>,
}

impl ControllerState {
    fn snapshot(&self) -> NavigationSnapshot {
        NavigationSnapshot {
            items: self.window.items().to_vec(),
            hit_top: self.window.hit_top(),
            hit_bottom: self.window.hit_bottom(),
            scroll_offset: self.last_scroll_offset,
        }
    }
}

/// Drives one message thread view: picks loads, applies pages, keeps the scroll
/// position stable, and saves itself to the navigation cache on the way out.
///
/// State lives behind one shared cell so the single history listener installed at
/// mount always reads the current window.
pub struct MessageListController {
    state: Rc<RefCell<ControllerState>>,
    thread: ThreadQuery,
    store: Arc<AppStore>,
    key: NavigationKey,
    config: ControllerConfig,
    _subscription: Subscription,
}

impl MessageListController {
    pub fn mount(
        thread: ThreadQuery,
        config: ControllerConfig,
        store: Arc<AppStore>,
        history: &NavigationHistory,
        view_id: &str,
    ) -> Self {
        let key = NavigationKey::new(history.current().key, view_id);
        let mut state = ControllerState {
            window: WindowedList::new(config.window),
            anchor: ScrollAnchor::new(),
            last_scroll_offset: None,
        };

        match store.page_state().take_for_mount(&key) {
            Ok(Some(snapshot)) if !snapshot.items.is_empty() => {
                tracing::info!(
                    %key,
                    items = snapshot.items.len(),
                    scroll_offset = ?snapshot.scroll_offset,
                    "restoring message list"
                );
                state
                    .window
                    .restore(snapshot.items, snapshot.hit_top, snapshot.hit_bottom);
                if let Some(offset) = snapshot.scroll_offset {
                    state.anchor.expect_restore(offset);
                    state.last_scroll_offset = Some(offset);
                }
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%key, %error, "navigation cache unavailable, loading fresh");
            }
        }

        let state = Rc::new(RefCell::new(state));
        let subscription = history.subscribe(save_on_leave(
            Rc::downgrade(&state),
            Arc::clone(store.page_state()),
            key.clone(),
        ));

        Self {
            state,
            thread,
            store,
            key,
            config,
            _subscription: subscription,
        }
    }

    pub fn navigation_key(&self) -> &NavigationKey {
        &self.key
    }

    pub fn thread(&self) -> &ThreadQuery {
        &self.thread
    }

    pub fn store(&self) -> &Arc<AppStore> {
        &self.store
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.borrow().window.items().to_vec()
    }

    pub fn len(&self) -> usize {
        self.state.borrow().window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().window.is_empty()
    }

    pub fn hit_top(&self) -> bool {
        self.state.borrow().window.hit_top()
    }

    pub fn hit_bottom(&self) -> bool {
        self.state.borrow().window.hit_bottom()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().window.is_loading()
    }

    pub fn rows(&self) -> Vec<MessageRow> {
        message_rows(self.state.borrow().window.items(), self.config.group_gap_millis)
    }

    pub fn snapshot(&self) -> NavigationSnapshot {
        self.state.borrow().snapshot()
    }

    /// Remembers where the user is, for the snapshot taken on navigation.
    pub fn record_scroll_offset(&self, offset: f64) {
        self.state.borrow_mut().last_scroll_offset = Some(offset);
    }

    /// Decides whether the current layout calls for a load and, if so, claims it.
    ///
    /// The loading flag and the signpost are both set before this returns, so a second
    /// call from the same batch of events sees the load already in flight.
    pub fn next_load(&self, layout: &impl PositionProvider<ItemId>) -> Option<LoadTicket> {
        let viewport = layout.viewport();
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;

        if !state.anchor.is_pending() {
            state.last_scroll_offset = Some(viewport.scroll_offset);
        }
        if state.window.is_loading() {
            return None;
        }

        let pending = if state.window.is_started() {
            let direction = pick_direction(&state.window, viewport, self.config.edge_threshold)?;
            let pending = state.window.begin(direction)?;
            if let Some(edge) = state.window.edge_item(direction) {
                let signpost = edge.key().clone();
                state.anchor.record_signpost(&signpost, layout);
            }
            pending
        } else {
            let place = self.thread.starting_place.clone();
            let pending = state.window.begin_start(place.clone())?;
            state.anchor.expect_start(place);
            pending
        };

        let query = self.thread.query_for(&pending.request);
        tracing::debug!(load = pending.id(), ?query, "issuing message load");
        Some(LoadTicket {
            query,
            pending,
            state: Rc::downgrade(&self.state),
            store: Arc::clone(&self.store),
            settled: false,
        })
    }

    pub fn complete(
        &self,
        ticket: LoadTicket,
        result: ApiResult<MessagePage>,
    ) -> ControllerResult<Option<PageApplied>> {
        ticket.complete(result)
    }

    /// Scroll offset to apply after the latest change has been laid out.
    pub fn after_render(&self, layout: &impl PositionProvider<ItemId>) -> Option<f64> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let offset = state.anchor.resolve(state.window.items(), layout)?;
        state.last_scroll_offset = Some(offset);
        Some(offset)
    }

    /// One scroll or mount check: load if needed and apply the result.
    pub async fn check<S>(
        &self,
        source: &S,
        layout: &impl PositionProvider<ItemId>,
    ) -> ControllerResult<Option<PageApplied>>
    where
        S: MessageSource + ?Sized,
    {
        let Some(ticket) = self.next_load(layout) else {
            return Ok(None);
        };
        let query = ticket.query().clone();
        let result = source.fetch_messages(&query).await;
        ticket.complete(result)
    }
}

fn pick_direction(
    window: &WindowedList<Item>,
    viewport: Viewport,
    threshold: f64,
) -> Option<Direction> {
    if viewport.is_underfilled() {
        if !window.hit_top() {
            return Some(Direction::Up);
        }
        if !window.hit_bottom() {
            return Some(Direction::Down);
        }
        return None;
    }
    if viewport.is_near_bottom(threshold) && !window.hit_bottom() {
        return Some(Direction::Down);
    }
    if viewport.is_near_top(threshold) && !window.hit_top() {
        return Some(Direction::Up);
    }
    None
}

fn save_on_leave(
    state: Weak<RefCell<ControllerState>>,
    cache: Arc<dyn NavigationStateCache>,
    key: NavigationKey,
) -> impl FnMut(&Transition) + 'static {
    move |transition| {
        if transition.from.key != key.location_key {
            return;
        }
        let Some(state) = state.upgrade() else {
            return;
        };
        let Ok(state) = state.try_borrow() else {
            tracing::warn!(%key, "message list busy during navigation, snapshot skipped");
            return;
        };
        if state.window.is_empty() {
            return;
        }
        if let Err(error) = cache.save(&key, &state.snapshot()) {
            tracing::warn!(%key, %error, "failed to save message list snapshot");
        }
    }
}

/// A claimed load. Complete it with the fetch result; dropping it cancels the load.
pub struct LoadTicket {
    query: MessageQuery,
    pending: PendingLoad,
    state: Weak<RefCell<ControllerState>>,
    store: Arc<AppStore>,
    settled: bool,
}

impl LoadTicket {
    pub fn query(&self) -> &MessageQuery {
        &self.query
    }

    pub fn request(&self) -> &LoadRequest {
        &self.pending.request
    }

    pub fn direction(&self) -> Option<Direction> {
        self.pending.direction()
    }

    /// Applies the result; `Ok(None)` when the list is gone or the load went stale.
    pub fn complete(
        mut self,
        result: ApiResult<MessagePage>,
    ) -> ControllerResult<Option<PageApplied>> {
        self.settled = true;
        let Some(state) = self.state.upgrade() else {
            tracing::debug!(load = self.pending.id(), "discarding page for unmounted list");
            return Ok(None);
        };
        let mut state = state.borrow_mut();

        let page = match result.context(FetchSnafu {
            stage: "controller-complete",
        }) {
            Ok(page) => page,
            Err(error) => {
                state.window.fail(&self.pending);
                state.anchor.cancel_signpost();
                tracing::warn!(load = self.pending.id(), %error, "message load failed");
                return Err(error);
            }
        };

        self.store.merge_users(&page.users);
        self.store.merge_conversations(&page.conversations);
        if page.skipped > 0 {
            tracing::warn!(
                load = self.pending.id(),
                skipped = page.skipped,
                "page contained malformed items"
            );
        }

        let applied = state.window.apply(&self.pending, page.items);
        match applied {
            Some(applied) => tracing::info!(
                load = self.pending.id(),
                direction = ?self.pending.direction(),
                added = applied.added,
                evicted = applied.evicted,
                exhausted = applied.exhausted,
                total = state.window.len(),
                "applied message page"
            ),
            None => state.anchor.cancel_signpost(),
        }
        Ok(applied)
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let Some(state) = self.state.upgrade() else {
            return;
        };
        if let Ok(mut state) = state.try_borrow_mut() {
            state.window.fail(&self.pending);
            state.anchor.cancel_signpost();
            tracing::debug!(load = self.pending.id(), "message load cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use dmview_api::{ApiError, BoxFuture, Message, Timestamp, UserId, UserSummary};
    use dmview_storage::InMemoryNavigationCache;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout::{EstimatedLayout, LayoutMetrics};

    const PAGE: usize = 20;

    fn stamp(n: usize) -> Timestamp {
        Timestamp::new(format!("2020-01-01T00:{:02}:{:02}.000Z", n / 60, n % 60))
    }

    /// Serves messages `1..=total` the way the archive pages them.
    struct FakeArchive {
        items: Vec<Item>,
        queries: Mutex<Vec<MessageQuery>>,
    }

    impl FakeArchive {
        fn new(total: usize) -> Self {
            let items = (1..=total)
                .map(|n| {
                    Item::Message(Message {
                        id: ItemId::new(n.to_string()),
                        conversation: "1-2".into(),
                        sender: UserId::new(if n % 4 < 2 { "a" } else { "b" }),
                        sent_time: stamp(n),
                        content: format!("message number {n}"),
                        html_content: String::new(),
                        media: Vec::new(),
                        reactions: Vec::new(),
                    })
                })
                .collect();
            Self {
                items,
                queries: Mutex::new(Vec::new()),
            }
        }

        fn page(&self, query: &MessageQuery) -> MessagePage {
            let before = |bound: Option<&Timestamp>, count: usize, inclusive: bool| {
                let earlier = self
                    .items
                    .iter()
                    .filter(|item| match bound {
                        Some(bound) if inclusive => item.time() <= bound,
                        Some(bound) => item.time() < bound,
                        None => true,
                    })
                    .cloned()
                    .collect::<Vec<_>>();
                earlier[earlier.len().saturating_sub(count)..].to_vec()
            };
            let after = |bound: Option<&Timestamp>, count: usize| {
                self.items
                    .iter()
                    .filter(|item| bound.is_none_or(|bound| item.time() > bound))
                    .take(count)
                    .cloned()
                    .collect::<Vec<_>>()
            };

            let items = match &query.position {
                Position::Before(Bound::Time(time)) => before(Some(time), PAGE, false),
                Position::Before(_) => before(None, PAGE, false),
                Position::After(Bound::Time(time)) => after(Some(time), PAGE),
                Position::After(_) => after(None, PAGE),
                Position::At(time) => {
                    let mut items = before(Some(time), PAGE / 2, true);
                    items.extend(after(Some(time), PAGE / 2));
                    items
                }
            };
            let users = ["a", "b"]
                .into_iter()
                .map(|id| UserSummary {
                    id: UserId::new(id),
                    handle: format!("user_{id}"),
                    ..UserSummary::default()
                })
                .collect();
            MessagePage::new(items).with_users(users)
        }

        fn requests(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    impl MessageSource for FakeArchive {
        fn fetch_messages<'a>(
            &'a self,
            query: &'a MessageQuery,
        ) -> BoxFuture<'a, ApiResult<MessagePage>> {
            self.queries.lock().unwrap().push(query.clone());
            let page = self.page(query);
            Box::pin(std::future::ready(Ok(page)))
        }
    }

    struct Unreachable;

    impl MessageSource for Unreachable {
        fn fetch_messages<'a>(
            &'a self,
            _query: &'a MessageQuery,
        ) -> BoxFuture<'a, ApiResult<MessagePage>> {
            Box::pin(std::future::ready(Err(ApiError::Status {
                stage: "test",
                endpoint: "/api/messages".to_string(),
                status: 502,
                body: "bad gateway".to_string(),
            })))
        }
    }

    fn config() -> ControllerConfig {
        ControllerConfig {
            window: WindowConfig {
                max_window: 100,
                short_page: Some(PAGE),
            },
            ..ControllerConfig::default()
        }
    }

    fn metrics(viewport_height: f64) -> LayoutMetrics {
        LayoutMetrics {
            content_width: 680.0,
            viewport_height,
        }
    }

    fn layout(controller: &MessageListController, viewport_height: f64, offset: f64) -> EstimatedLayout {
        EstimatedLayout::measure(&controller.rows(), metrics(viewport_height)).scrolled_to(offset)
    }

    fn mount(
        place: StartingPlace,
        store: &Arc<AppStore>,
        history: &NavigationHistory,
    ) -> MessageListController {
        MessageListController::mount(
            ThreadQuery::new(Selector::Conversation("1-2".into())).starting_at(place),
            config(),
            Arc::clone(store),
            history,
            "messages",
        )
    }

    fn ids(controller: &MessageListController) -> Vec<usize> {
        controller
            .items()
            .iter()
            .map(|item| item.id().as_str().parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn end_start_then_scrolling_up_reaches_the_top() {
        let archive = FakeArchive::new(45);
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/conversation/messages/1-2");
        let list = mount(StartingPlace::End, &store, &history);

        list.check(&archive, &layout(&list, 400.0, 0.0)).await.unwrap();
        assert_eq!(ids(&list), (26..=45).collect::<Vec<_>>());
        assert!(list.hit_bottom());
        assert!(!list.hit_top());

        let rendered = layout(&list, 400.0, 0.0);
        let offset = list.after_render(&rendered).unwrap();
        assert_eq!(offset, rendered.viewport().max_scroll());

        // Scrolled to the bottom: nothing to do.
        list.check(&archive, &layout(&list, 400.0, offset)).await.unwrap();
        assert_eq!(archive.requests(), 1);

        for _ in 0..2 {
            let before = layout(&list, 400.0, 0.0);
            let signpost = list.items()[0].id().clone();
            let top_before = before.item_bounds(&signpost).unwrap().top;
            list.check(&archive, &before).await.unwrap();

            let after = layout(&list, 400.0, 0.0);
            let offset = list.after_render(&after).unwrap();
            let top_after = after.item_bounds(&signpost).unwrap().top;
            assert_eq!(top_after - offset, top_before);
        }

        assert_eq!(ids(&list), (1..=45).collect::<Vec<_>>());
        assert!(list.hit_top());
        assert!(list.hit_bottom());

        list.check(&archive, &layout(&list, 400.0, 0.0)).await.unwrap();
        assert_eq!(archive.requests(), 3);
    }

    #[tokio::test]
    async fn timestamp_start_centers_the_matching_item() {
        let archive = FakeArchive::new(60);
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/messages");
        let list = mount(StartingPlace::At(stamp(37)), &store, &history);

        list.check(&archive, &layout(&list, 300.0, 0.0)).await.unwrap();
        assert_eq!(ids(&list), (28..=47).collect::<Vec<_>>());
        assert!(!list.hit_top());
        assert!(!list.hit_bottom());

        let rendered = layout(&list, 300.0, 0.0);
        let offset = list.after_render(&rendered).unwrap();
        let bounds = rendered.item_bounds(&ItemId::new("37")).unwrap();
        let viewport = rendered.viewport();

        assert_eq!(
            offset,
            viewport.clamp(bounds.top + bounds.height / 2.0 - viewport.height / 2.0)
        );
        assert!(offset > 0.0 && offset < viewport.max_scroll());
    }

    #[tokio::test]
    async fn users_reach_the_store_with_their_messages() {
        let archive = FakeArchive::new(10);
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/messages");
        let list = mount(StartingPlace::Beginning, &store, &history);

        assert!(store.user(&UserId::new("a")).is_none());
        list.check(&archive, &layout(&list, 300.0, 0.0)).await.unwrap();

        assert_eq!(
            store.user(&UserId::new("b")).map(|user| user.handle),
            Some("user_b".to_string())
        );
        assert!(list.hit_top());
        assert!(list.hit_bottom());
    }

    #[test]
    fn one_claim_at_a_time_and_dropped_tickets_release_it() {
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/messages");
        let list = mount(StartingPlace::End, &store, &history);
        let empty = layout(&list, 300.0, 0.0);

        let ticket = list.next_load(&empty).unwrap();
        assert_eq!(ticket.request(), &LoadRequest::Start(StartingPlace::End));
        assert_eq!(ticket.query().position, Position::Before(Bound::End));
        assert!(list.is_loading());
        assert!(list.next_load(&empty).is_none());

        drop(ticket);
        assert!(!list.is_loading());
        assert!(list.next_load(&empty).is_some());
    }

    #[tokio::test]
    async fn failed_fetch_clears_loading_and_retries_later() {
        let archive = FakeArchive::new(30);
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/messages");
        let list = mount(StartingPlace::End, &store, &history);

        let error = list
            .check(&Unreachable, &layout(&list, 300.0, 0.0))
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            crate::ControllerError::Fetch {
                source: ApiError::Status { status: 502, .. },
                ..
            }
        ));
        assert!(!list.is_loading());
        assert!(list.is_empty());

        list.check(&archive, &layout(&list, 300.0, 0.0)).await.unwrap();
        assert_eq!(list.len(), PAGE);
    }

    #[tokio::test]
    async fn underfilled_view_loads_up_before_down() {
        let archive = FakeArchive::new(100);
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/messages");
        let list = mount(StartingPlace::At(stamp(50)), &store, &history);
        list.check(&archive, &layout(&list, 300.0, 0.0)).await.unwrap();
        list.after_render(&layout(&list, 300.0, 0.0));

        let tall = layout(&list, 100_000.0, 0.0);
        let ticket = list.next_load(&tall).unwrap();
        assert_eq!(ticket.direction(), Some(Direction::Up));
        let page = archive.page(ticket.query());
        list.complete(ticket, Ok(page)).unwrap();

        while !list.hit_top() {
            list.check(&archive, &layout(&list, 100_000.0, 0.0)).await.unwrap();
        }
        let ticket = list.next_load(&layout(&list, 100_000.0, 0.0)).unwrap();
        assert_eq!(ticket.direction(), Some(Direction::Down));
    }

    #[tokio::test]
    async fn navigation_saves_and_restores_scroll_once() {
        let archive = FakeArchive::new(80);
        let cache = Arc::new(InMemoryNavigationCache::new());
        let store = Arc::new(AppStore::new(cache.clone()));
        let history = NavigationHistory::new("/conversation/messages/1-2");

        let list = mount(StartingPlace::End, &store, &history);
        list.check(&archive, &layout(&list, 300.0, 0.0)).await.unwrap();
        list.after_render(&layout(&list, 300.0, 0.0));
        list.record_scroll_offset(321.0);
        let saved_items = list.items();

        history.push("/user/a");
        assert_eq!(cache.len().unwrap(), 1);
        drop(list);

        history.back();
        let restored = mount(StartingPlace::End, &store, &history);
        assert_eq!(restored.items(), saved_items);
        assert!(restored.hit_bottom());
        assert!(!restored.hit_top());
        let rendered = layout(&restored, 300.0, 0.0);
        assert_eq!(restored.after_render(&rendered), Some(321.0));
        assert_eq!(restored.after_render(&rendered), None);
        drop(restored);

        let again = mount(StartingPlace::End, &store, &history);
        assert_eq!(again.items(), saved_items);
        assert_eq!(again.after_render(&layout(&again, 300.0, 0.0)), None);
        assert_eq!(archive.requests(), 1);
    }

    #[tokio::test]
    async fn dropped_controller_stops_listening() {
        let archive = FakeArchive::new(30);
        let cache = Arc::new(InMemoryNavigationCache::new());
        let store = Arc::new(AppStore::new(cache.clone()));
        let history = NavigationHistory::new("/messages");

        let list = mount(StartingPlace::End, &store, &history);
        list.check(&archive, &layout(&list, 300.0, 0.0)).await.unwrap();
        assert_eq!(history.listener_count(), 1);

        drop(list);
        assert_eq!(history.listener_count(), 0);
        history.push("/conversations");
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn empty_lists_are_not_saved() {
        let cache = Arc::new(InMemoryNavigationCache::new());
        let store = Arc::new(AppStore::new(cache.clone()));
        let history = NavigationHistory::new("/messages");
        let _list = mount(StartingPlace::End, &store, &history);

        history.push("/conversations");
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn responses_for_unmounted_lists_are_discarded() {
        let archive = FakeArchive::new(30);
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/messages");
        let list = mount(StartingPlace::End, &store, &history);

        let ticket = list.next_load(&layout(&list, 300.0, 0.0)).unwrap();
        let page = archive.page(ticket.query());
        drop(list);

        assert_eq!(ticket.complete(Ok(page)).unwrap(), None);
        assert!(store.users().is_empty());
    }

    #[test]
    fn rows_group_consecutive_messages_from_one_sender() {
        let archive = FakeArchive::new(8);
        let store = Arc::new(AppStore::default());
        let history = NavigationHistory::new("/messages");
        let list = mount(StartingPlace::Beginning, &store, &history);

        let ticket = list.next_load(&layout(&list, 300.0, 0.0)).unwrap();
        let page = archive.page(ticket.query());
        list.complete(ticket, Ok(page)).unwrap();

        let grouped = list
            .rows()
            .iter()
            .map(|row| row.grouped_with_previous)
            .collect::<Vec<_>>();
        // Senders run a, b, b, a, a, b, b, a.
        assert_eq!(grouped, vec![false, false, true, false, true, false, true, false]);
    }
}
