use super::anchor::Viewport;

/// Distance from the bottom, in pixels, at which the next page is requested.
pub const PAGED_BOTTOM_THRESHOLD: f64 = 30.0;

/// A page number handed out by `PagedList::next_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
}

/// Forward-only list fetched one numbered page at a time, starting from page 1.
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    items: Vec<T>,
    next_page: u32,
    loading: bool,
    exhausted: bool,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_page: 1,
            loading: false,
            exhausted: false,
        }
    }
}

impl<T> PagedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Claims the next page; `None` while a page is in flight or after the last one.
    pub fn next_page(&mut self) -> Option<PageRequest> {
        if self.loading || self.exhausted {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            page: self.next_page,
        })
    }

    pub fn apply(&mut self, request: PageRequest, results: Vec<T>) {
        if !self.loading || request.page != self.next_page {
            tracing::debug!(page = request.page, "ignoring stale page");
            return;
        }
        self.loading = false;
        if results.is_empty() {
            self.exhausted = true;
            tracing::debug!(page = request.page, "paged list exhausted");
            return;
        }
        self.items.extend(results);
        self.next_page += 1;
    }

    pub fn fail(&mut self, request: PageRequest) {
        if request.page == self.next_page {
            self.loading = false;
        }
    }

    /// More is wanted when the content does not fill the viewport or its bottom is close.
    pub fn should_load(&self, viewport: Viewport) -> bool {
        !self.loading
            && !self.exhausted
            && (viewport.is_underfilled() || viewport.is_near_bottom(PAGED_BOTTOM_THRESHOLD))
    }

    /// Starts over from page 1, e.g. after the sort order changed.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
