use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use dmview_api::{Item, ItemId, Timestamp};

use crate::anchor::nearest_index;

/// Default cap on how many items a window keeps in memory.
pub const DEFAULT_MAX_WINDOW: usize = 100;

/// What a window needs from the things it holds.
pub trait WindowItem: Clone {
    type Key: Clone + Eq + Hash + Debug;

    fn key(&self) -> &Self::Key;
    fn time(&self) -> &Timestamp;

    /// Whether the item counts toward the server's page size.
    fn counts_toward_page(&self) -> bool {
        true
    }
}

impl WindowItem for Item {
    type Key = ItemId;

    fn key(&self) -> &ItemId {
        self.id()
    }

    fn time(&self) -> &Timestamp {
        Item::time(self)
    }

    // Events ride along with a page of messages; only messages fill it.
    fn counts_toward_page(&self) -> bool {
        self.is_message()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

/// Where the first page of a thread is taken from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StartingPlace {
    Beginning,
    #[default]
    End,
    At(Timestamp),
}

impl StartingPlace {
    /// `beginning`, `end`, or anything else as a timestamp.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "beginning" => Self::Beginning,
            "end" | "" => Self::End,
            other => Self::At(Timestamp::new(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Start(StartingPlace),
    Page {
        direction: Direction,
        cursor: Timestamp,
    },
}

/// A load the window has agreed to; hand it back through `apply` or `fail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    id: u64,
    pub request: LoadRequest,
}

impl PendingLoad {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn direction(&self) -> Option<Direction> {
        match &self.request {
            LoadRequest::Start(_) => None,
            LoadRequest::Page { direction, .. } => Some(*direction),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageApplied {
    pub added: usize,
    pub evicted: usize,
    /// The loaded direction is now known to have nothing further.
    pub exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    pub max_window: usize,
    /// A directional page with fewer counted items than this is the last one.
    pub short_page: Option<usize>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_window: DEFAULT_MAX_WINDOW,
            short_page: None,
        }
    }
}

/// Bidirectionally paged, size-capped, time-ordered list.
#[derive(Debug, Clone)]
pub struct WindowedList<T: WindowItem> {
    items: Vec<T>,
    hit_top: bool,
    hit_bottom: bool,
    started: bool,
    loading: Option<u64>,
    next_load_id: u64,
    config: WindowConfig,
}

impl<T: WindowItem> Default for WindowedList<T> {
    fn default() -> Self {
        Self::new(WindowConfig::default())
    }
}

impl<T: WindowItem> WindowedList<T> {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            items: Vec::new(),
            hit_top: false,
            hit_bottom: false,
            started: false,
            loading: None,
            next_load_id: 1,
            config: WindowConfig {
                max_window: config.max_window.max(1),
                short_page: config.short_page,
            },
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn hit_top(&self) -> bool {
        self.hit_top
    }

    pub fn hit_bottom(&self) -> bool {
        self.hit_bottom
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn config(&self) -> WindowConfig {
        self.config
    }

    pub fn is_exhausted(&self, direction: Direction) -> bool {
        match direction {
            Direction::Up => self.hit_top,
            Direction::Down => self.hit_bottom,
        }
    }

    /// Item whose position is tracked while loading toward `direction`.
    pub fn edge_item(&self, direction: Direction) -> Option<&T> {
        match direction {
            Direction::Up => self.items.first(),
            Direction::Down => self.items.last(),
        }
    }

    pub fn begin_start(&mut self, place: StartingPlace) -> Option<PendingLoad> {
        if self.loading.is_some() {
            return None;
        }
        Some(self.issue(LoadRequest::Start(place)))
    }

    /// `None` while any load is in flight, when `direction` is exhausted, or before
    /// there is an edge item to page from.
    pub fn begin(&mut self, direction: Direction) -> Option<PendingLoad> {
        if self.loading.is_some() || self.is_exhausted(direction) {
            return None;
        }
        let cursor = self.edge_item(direction)?.time().clone();
        Some(self.issue(LoadRequest::Page { direction, cursor }))
    }

    fn issue(&mut self, request: LoadRequest) -> PendingLoad {
        let id = self.next_load_id;
        self.next_load_id += 1;
        self.loading = Some(id);
        PendingLoad { id, request }
    }

    fn take_pending(&mut self, pending: &PendingLoad) -> bool {
        if self.loading == Some(pending.id) {
            self.loading = None;
            true
        } else {
            tracing::debug!(load = pending.id, "ignoring stale load");
            false
        }
    }

    /// Releases the loading flag without touching items or boundaries.
    pub fn fail(&mut self, pending: &PendingLoad) {
        self.take_pending(pending);
    }

    /// Applies a fetched page; `None` when `pending` is not the load in flight.
    pub fn apply(&mut self, pending: &PendingLoad, mut page: Vec<T>) -> Option<PageApplied> {
        if !self.take_pending(pending) {
            return None;
        }
        page.sort_by(|left, right| left.time().cmp(right.time()));

        let applied = match &pending.request {
            LoadRequest::Start(place) => self.apply_start(place, page),
            LoadRequest::Page { direction, .. } => self.apply_page(*direction, page),
        };
        Some(applied)
    }

    fn is_short(&self, page: &[T]) -> bool {
        self.config.short_page.is_some_and(|full| {
            page.iter().filter(|item| item.counts_toward_page()).count() < full
        })
    }

    fn apply_start(&mut self, place: &StartingPlace, page: Vec<T>) -> PageApplied {
        let short = self.is_short(&page);
        self.started = true;
        self.hit_top = false;
        self.hit_bottom = false;

        if page.is_empty() {
            self.hit_top = true;
            self.hit_bottom = true;
        } else {
            match place {
                StartingPlace::Beginning => {
                    self.hit_top = true;
                    self.hit_bottom = short;
                }
                StartingPlace::End => {
                    self.hit_bottom = true;
                    self.hit_top = short;
                }
                StartingPlace::At(_) => {}
            }
        }

        self.items = dedup_keys(page);
        let evicted = self.trim_start(place);
        tracing::debug!(
            ?place,
            items = self.items.len(),
            hit_top = self.hit_top,
            hit_bottom = self.hit_bottom,
            "window started"
        );

        PageApplied {
            added: self.items.len(),
            evicted,
            exhausted: self.hit_top && self.hit_bottom,
        }
    }

    fn apply_page(&mut self, direction: Direction, page: Vec<T>) -> PageApplied {
        let short = self.is_short(&page);
        let known: HashSet<T::Key> = self.items.iter().map(|item| item.key().clone()).collect();

        // Only items strictly past the current edge keep the order intact.
        let fresh: Vec<T> = match (direction, self.edge_item(direction)) {
            (Direction::Up, Some(edge)) => {
                let edge = edge.time().clone();
                page.into_iter()
                    .filter(|item| item.time() < &edge && !known.contains(item.key()))
                    .collect()
            }
            (Direction::Down, Some(edge)) => {
                let edge = edge.time().clone();
                page.into_iter()
                    .filter(|item| item.time() > &edge && !known.contains(item.key()))
                    .collect()
            }
            (_, None) => page,
        };
        let mut fresh = dedup_keys(fresh);
        let found = fresh.len();

        // The old edge item is the scroll signpost, so a page never pushes it out.
        let room = self.config.max_window.saturating_sub(1).max(1);
        let dropped = found.saturating_sub(room);
        if dropped > 0 {
            match direction {
                Direction::Up => {
                    fresh.drain(..dropped);
                }
                Direction::Down => fresh.truncate(room),
            }
            tracing::debug!(
                ?direction,
                dropped,
                "page larger than the window, kept the part nearest the edge"
            );
        }
        let added = fresh.len();

        let exhausted = found == 0 || (short && dropped == 0);
        if exhausted {
            match direction {
                Direction::Up => self.hit_top = true,
                Direction::Down => self.hit_bottom = true,
            }
            tracing::debug!(?direction, added, "window direction exhausted");
        }

        match direction {
            Direction::Up => {
                let mut merged = fresh;
                merged.append(&mut self.items);
                self.items = merged;
            }
            Direction::Down => self.items.extend(fresh),
        }
        let evicted = self.evict(direction);

        PageApplied {
            added,
            evicted,
            exhausted,
        }
    }

    /// Trims a first page under the cap, keeping the part its anchor points at.
    fn trim_start(&mut self, place: &StartingPlace) -> usize {
        let len = self.items.len();
        let max = self.config.max_window;
        if len <= max {
            return 0;
        }

        let start = match place {
            StartingPlace::Beginning => 0,
            StartingPlace::End => len - max,
            StartingPlace::At(time) => {
                let center = nearest_index(&self.items, time, |item| item.time()).unwrap_or(0);
                center.saturating_sub(max / 2).min(len - max)
            }
        };
        self.items.truncate(start + max);
        self.items.drain(..start);
        if start > 0 {
            self.hit_top = false;
        }
        if start + max < len {
            self.hit_bottom = false;
        }

        let evicted = len - max;
        tracing::debug!(?place, evicted, "trimmed first page to the window");
        evicted
    }

    /// Trims the end opposite `loaded` back under the cap.
    fn evict(&mut self, loaded: Direction) -> usize {
        let overflow = self.items.len().saturating_sub(self.config.max_window);
        if overflow == 0 {
            return 0;
        }
        match loaded {
            Direction::Up => {
                self.items.truncate(self.config.max_window);
                self.hit_bottom = false;
            }
            Direction::Down => {
                self.items.drain(..overflow);
                self.hit_top = false;
            }
        }
        tracing::debug!(?loaded, evicted = overflow, "evicted items from window");
        overflow
    }

    /// Replaces everything with previously captured state.
    pub fn restore(&mut self, items: Vec<T>, hit_top: bool, hit_bottom: bool) {
        self.items = items;
        self.hit_top = hit_top;
        self.hit_bottom = hit_bottom;
        self.started = true;
        self.loading = None;
    }
}

fn dedup_keys<T: WindowItem>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.key().clone()))
        .collect()
}
