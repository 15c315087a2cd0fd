use dmview_api::Timestamp;

use super::window::{StartingPlace, WindowItem};

/// Vertical extent of one laid-out item, in content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemBounds {
    pub top: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub scroll_offset: f64,
    pub height: f64,
    pub content_height: f64,
}

impl Viewport {
    pub fn max_scroll(&self) -> f64 {
        (self.content_height - self.height).max(0.0)
    }

    pub fn clamp(&self, offset: f64) -> f64 {
        offset.clamp(0.0, self.max_scroll())
    }

    /// Content is shorter than the viewport, so nothing can be scrolled.
    pub fn is_underfilled(&self) -> bool {
        self.content_height < self.height
    }

    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.scroll_offset + self.height > self.content_height - threshold
    }

    pub fn is_near_top(&self, threshold: f64) -> bool {
        self.scroll_offset < threshold
    }
}

/// Read access to whatever lays the list out.
pub trait PositionProvider<K> {
    fn item_bounds(&self, key: &K) -> Option<ItemBounds>;
    fn viewport(&self) -> Viewport;
}

#[derive(Debug, Clone, PartialEq)]
enum AnchorPlan<K> {
    Signpost {
        key: K,
        previous_top: f64,
        previous_scroll: f64,
    },
    Start(StartingPlace),
    Restore(f64),
}

/// Keeps the reader's place while content is inserted above or below it.
///
/// A plan is recorded before the window mutates and resolved once after the new
/// content is laid out. Resolving consumes the plan, so repeated renders never apply
/// the same correction twice.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollAnchor<K> {
    plan: Option<AnchorPlan<K>>,
}

impl<K> Default for ScrollAnchor<K> {
    fn default() -> Self {
        Self { plan: None }
    }
}

impl<K: Clone + PartialEq> ScrollAnchor<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.plan.is_some()
    }

    /// Remembers where `key` sits before a directional load.
    ///
    /// When the signpost is not laid out there is nothing to correct against, so no
    /// plan is recorded.
    pub fn record_signpost(&mut self, key: &K, provider: &impl PositionProvider<K>) {
        if matches!(self.plan, Some(AnchorPlan::Restore(_))) {
            return;
        }
        self.plan = provider.item_bounds(key).map(|bounds| AnchorPlan::Signpost {
            key: key.clone(),
            previous_top: bounds.top,
            previous_scroll: provider.viewport().scroll_offset,
        });
    }

    pub fn expect_start(&mut self, place: StartingPlace) {
        if !matches!(self.plan, Some(AnchorPlan::Restore(_))) {
            self.plan = Some(AnchorPlan::Start(place));
        }
    }

    /// A restored offset wins over any other pending plan.
    pub fn expect_restore(&mut self, offset: f64) {
        self.plan = Some(AnchorPlan::Restore(offset));
    }

    pub fn clear(&mut self) {
        self.plan = None;
    }

    /// Drops a pending signpost without touching restoration or start plans.
    pub fn cancel_signpost(&mut self) {
        if matches!(self.plan, Some(AnchorPlan::Signpost { .. })) {
            self.plan = None;
        }
    }

    /// Scroll offset to apply now that `items` are laid out, if any.
    pub fn resolve<T>(&mut self, items: &[T], provider: &impl PositionProvider<K>) -> Option<f64>
    where
        T: WindowItem<Key = K>,
    {
        let viewport = provider.viewport();
        match self.plan.take()? {
            AnchorPlan::Restore(offset) => Some(viewport.clamp(offset)),
            AnchorPlan::Signpost {
                key,
                previous_top,
                previous_scroll,
            } => {
                let current = provider.item_bounds(&key)?;
                Some(previous_scroll + (current.top - previous_top))
            }
            AnchorPlan::Start(StartingPlace::Beginning) => Some(0.0),
            AnchorPlan::Start(StartingPlace::End) => Some(viewport.max_scroll()),
            AnchorPlan::Start(StartingPlace::At(time)) => {
                let index = nearest_index(items, &time, |item| item.time())?;
                let bounds = provider.item_bounds(items[index].key())?;
                Some(viewport.clamp(bounds.top + bounds.height / 2.0 - viewport.height / 2.0))
            }
        }
    }
}

/// Index of the item whose time is closest to `query` in an ascending slice.
///
/// Equal distances favor the earlier neighbor, and a run of identical times resolves
/// to its first index. Neighbors whose time does not parse lose to ones that do.
pub fn nearest_index<T>(
    items: &[T],
    query: &Timestamp,
    time_of: impl Fn(&T) -> &Timestamp,
) -> Option<usize> {
    if items.is_empty() {
        return None;
    }

    let upper = items.partition_point(|item| time_of(item) < query);
    if upper == 0 {
        return Some(0);
    }
    let lower = upper - 1;
    if upper == items.len() {
        return Some(first_of_run(items, lower, &time_of));
    }
    if time_of(&items[upper]) == query {
        return Some(upper);
    }

    let below = time_of(&items[lower]).distance_millis(query);
    let above = time_of(&items[upper]).distance_millis(query);
    let pick_lower = match (below, above) {
        (Some(below), Some(above)) => below <= above,
        (Some(_), None) | (None, None) => true,
        (None, Some(_)) => false,
    };

    if pick_lower {
        Some(first_of_run(items, lower, &time_of))
    } else {
        Some(upper)
    }
}

fn first_of_run<T>(items: &[T], mut index: usize, time_of: &impl Fn(&T) -> &Timestamp) -> usize {
    while index > 0 && time_of(&items[index - 1]) == time_of(&items[index]) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::window::tests::{Entry, entries, stamp};

    /// Rows of equal height stacked from the top.
    struct FixedRows {
        tops: HashMap<u32, ItemBounds>,
        viewport: Viewport,
    }

    impl FixedRows {
        fn new(items: &[Entry], row_height: f64, viewport_height: f64, scroll: f64) -> Self {
            let tops = items
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    (
                        entry.id,
                        ItemBounds {
                            top: index as f64 * row_height,
                            height: row_height,
                        },
                    )
                })
                .collect();
            Self {
                tops,
                viewport: Viewport {
                    scroll_offset: scroll,
                    height: viewport_height,
                    content_height: items.len() as f64 * row_height,
                },
            }
        }
    }

    impl PositionProvider<u32> for FixedRows {
        fn item_bounds(&self, key: &u32) -> Option<ItemBounds> {
            self.tops.get(key).copied()
        }

        fn viewport(&self) -> Viewport {
            self.viewport
        }
    }

    fn times(seconds: &[u32]) -> Vec<Timestamp> {
        seconds.iter().map(|second| stamp(*second)).collect()
    }

    fn nearest(seconds: &[u32], query: u32) -> Option<usize> {
        nearest_index(&times(seconds), &stamp(query), |time| time)
    }

    #[test]
    fn nearest_handles_edges_and_exact_hits() {
        assert_eq!(nearest(&[], 5), None);
        assert_eq!(nearest(&[10, 20, 30], 1), Some(0));
        assert_eq!(nearest(&[10, 20, 30], 99), Some(2));
        assert_eq!(nearest(&[10, 20, 30], 20), Some(1));
    }

    #[test]
    fn nearest_prefers_smaller_distance_then_earlier() {
        assert_eq!(nearest(&[10, 20, 30], 24), Some(1));
        assert_eq!(nearest(&[10, 20, 30], 26), Some(2));
        assert_eq!(nearest(&[10, 20, 30], 25), Some(1));
    }

    #[test]
    fn nearest_resolves_identical_times_to_first_index() {
        assert_eq!(nearest(&[10, 20, 20, 20, 40], 20), Some(1));
        assert_eq!(nearest(&[10, 20, 20, 20, 40], 29), Some(1));
        assert_eq!(nearest(&[10, 20, 20, 20], 90), Some(1));
    }

    #[test]
    fn nearest_is_never_beaten_by_a_neighbor() {
        let seconds = [3, 8, 8, 15, 16, 40, 41, 77, 100];
        let list = times(&seconds);
        for query in 0..120 {
            let index = nearest(&seconds, query).unwrap();
            let distance = |i: usize| list[i].distance_millis(&stamp(query)).unwrap();
            if index > 0 {
                assert!(distance(index) <= distance(index - 1), "query {query}");
            }
            if index + 1 < list.len() {
                assert!(distance(index) <= distance(index + 1), "query {query}");
                if distance(index) == distance(index + 1) {
                    assert!(list[index] <= list[index + 1]);
                }
            }
        }
    }

    #[test]
    fn unparsable_neighbor_loses() {
        let list = vec![stamp(10), Timestamp::new("2020-01-01T00:00:2x")];
        assert_eq!(nearest_index(&list, &stamp(19), |time| time), Some(0));
    }

    #[test]
    fn signpost_offset_reproduces_item_position() {
        let before = entries(50..=69);
        let layout_before = FixedRows::new(&before, 40.0, 400.0, 30.0);
        let mut anchor = ScrollAnchor::new();
        anchor.record_signpost(&50, &layout_before);

        let after = entries(30..=69);
        let layout_after = FixedRows::new(&after, 40.0, 400.0, 30.0);
        let offset = anchor.resolve(&after, &layout_after).unwrap();

        // Item 50 was 30px above the viewport top and still is.
        assert_eq!(offset, 830.0);
        assert_eq!(
            layout_after.item_bounds(&50).unwrap().top - offset,
            layout_before.item_bounds(&50).unwrap().top - 30.0
        );
        assert_eq!(anchor.resolve(&after, &layout_after), None);
    }

    #[test]
    fn appended_content_leaves_offset_unchanged() {
        let before = entries(1..=20);
        let layout_before = FixedRows::new(&before, 25.0, 300.0, 200.0);
        let mut anchor = ScrollAnchor::new();
        anchor.record_signpost(&20, &layout_before);

        let after = entries(1..=40);
        let layout_after = FixedRows::new(&after, 25.0, 300.0, 200.0);
        assert_eq!(anchor.resolve(&after, &layout_after), Some(200.0));
    }

    #[test]
    fn evicted_signpost_yields_no_correction() {
        let before = entries(1..=20);
        let layout_before = FixedRows::new(&before, 25.0, 300.0, 0.0);
        let mut anchor = ScrollAnchor::new();
        anchor.record_signpost(&1, &layout_before);

        let after = entries(11..=30);
        let layout_after = FixedRows::new(&after, 25.0, 300.0, 0.0);
        assert_eq!(anchor.resolve(&after, &layout_after), None);
        assert!(!anchor.is_pending());
    }

    #[test]
    fn first_load_edges() {
        let items = entries(1..=30);
        let layout = FixedRows::new(&items, 20.0, 200.0, 0.0);

        let mut anchor = ScrollAnchor::new();
        anchor.expect_start(StartingPlace::Beginning);
        assert_eq!(anchor.resolve(&items, &layout), Some(0.0));

        anchor.expect_start(StartingPlace::End);
        assert_eq!(anchor.resolve(&items, &layout), Some(400.0));

        let short = entries(1..=3);
        let short_layout = FixedRows::new(&short, 20.0, 200.0, 0.0);
        anchor.expect_start(StartingPlace::End);
        assert_eq!(anchor.resolve(&short, &short_layout), Some(0.0));
    }

    #[test]
    fn timestamp_start_centers_matching_item() {
        let items = entries(1..=60);
        let layout = FixedRows::new(&items, 50.0, 500.0, 0.0);
        let mut anchor = ScrollAnchor::new();
        anchor.expect_start(StartingPlace::At(stamp(37)));

        let offset = anchor.resolve(&items, &layout).unwrap();
        let bounds = layout.item_bounds(&37).unwrap();

        assert_eq!(offset, 1575.0);
        assert_eq!(bounds.top + bounds.height / 2.0 - offset, 250.0);
    }

    #[test]
    fn timestamp_start_near_the_edge_is_clamped() {
        let items = entries(1..=60);
        let layout = FixedRows::new(&items, 50.0, 500.0, 0.0);
        let mut anchor = ScrollAnchor::new();
        anchor.expect_start(StartingPlace::At(stamp(2)));
        assert_eq!(anchor.resolve(&items, &layout), Some(0.0));
    }

    #[test]
    fn restoration_wins_over_other_plans() {
        let items = entries(1..=60);
        let layout = FixedRows::new(&items, 50.0, 500.0, 0.0);
        let mut anchor = ScrollAnchor::new();
        anchor.expect_restore(1234.0);
        anchor.expect_start(StartingPlace::End);
        anchor.record_signpost(&1, &layout);

        assert_eq!(anchor.resolve(&items, &layout), Some(1234.0));
        assert_eq!(anchor.resolve(&items, &layout), None);
    }
}
