use std::collections::HashMap;

use dmview_api::{Item, ItemId, Message};

use super::anchor::{ItemBounds, PositionProvider, Viewport};
use super::grouping::MessageRow;

const DEFAULT_CONTENT_WIDTH: f64 = 680.0;
const LIST_HORIZONTAL_PADDING: f64 = 16.0;
const ESTIMATED_TEXT_LINE_HEIGHT: f64 = 18.0;
const ESTIMATED_CHAR_WIDTH: f64 = 7.0;
const ATTRIBUTION_HEIGHT: f64 = 16.0;
const ATTRIBUTION_GAP: f64 = 6.0;
const MEDIA_MAX_HEIGHT: f64 = 320.0;
const MEDIA_GAP: f64 = 8.0;
const REACTION_ROW_HEIGHT: f64 = 20.0;
const EVENT_ROW_HEIGHT: f64 = 24.0;
const ROW_GAP: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    pub content_width: f64,
    pub viewport_height: f64,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            content_width: DEFAULT_CONTENT_WIDTH,
            viewport_height: 600.0,
        }
    }
}

/// Deterministic row layout from estimated heights, for driving the engine without
/// a real renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatedLayout {
    bounds: HashMap<ItemId, ItemBounds>,
    viewport: Viewport,
}

impl EstimatedLayout {
    pub fn measure(rows: &[MessageRow], metrics: LayoutMetrics) -> Self {
        let width = (metrics.content_width - LIST_HORIZONTAL_PADDING * 2.0).max(1.0);
        let mut bounds = HashMap::with_capacity(rows.len());
        let mut top = 0.0;

        for row in rows {
            let height = estimate_row_height(row, width);
            bounds.insert(row.item.id().clone(), ItemBounds { top, height });
            top += height + ROW_GAP;
        }

        let content_height = if rows.is_empty() { 0.0 } else { top - ROW_GAP };
        Self {
            bounds,
            viewport: Viewport {
                scroll_offset: 0.0,
                height: metrics.viewport_height,
                content_height,
            },
        }
    }

    /// Same layout scrolled to `offset`, clamped to the scrollable range.
    pub fn scrolled_to(mut self, offset: f64) -> Self {
        self.viewport.scroll_offset = self.viewport.clamp(offset);
        self
    }

    pub fn scrolled_by(self, delta: f64) -> Self {
        let offset = self.viewport.scroll_offset + delta;
        self.scrolled_to(offset)
    }

    pub fn scroll_offset(&self) -> f64 {
        self.viewport.scroll_offset
    }

    /// Ids of rows intersecting the viewport, top to bottom.
    pub fn visible(&self) -> Vec<&ItemId> {
        let start = self.viewport.scroll_offset;
        let end = start + self.viewport.height;
        let mut visible = self
            .bounds
            .iter()
            .filter(|(_, bounds)| bounds.top < end && bounds.top + bounds.height > start)
            .collect::<Vec<_>>();
        visible.sort_by(|left, right| left.1.top.total_cmp(&right.1.top));
        visible.into_iter().map(|(id, _)| id).collect()
    }
}

impl PositionProvider<ItemId> for EstimatedLayout {
    fn item_bounds(&self, key: &ItemId) -> Option<ItemBounds> {
        self.bounds.get(key).copied()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }
}

fn estimate_row_height(row: &MessageRow, width: f64) -> f64 {
    match &row.item {
        Item::Message(message) => estimate_message_height(message, width, row.grouped_with_previous),
        Item::NameUpdate(_) | Item::ParticipantJoin(_) | Item::ParticipantLeave(_) => {
            EVENT_ROW_HEIGHT
        }
    }
}

fn estimate_message_height(message: &Message, width: f64, grouped: bool) -> f64 {
    let mut height = estimate_text_height(&message.content, width);
    if !grouped {
        height += ATTRIBUTION_HEIGHT + ATTRIBUTION_GAP;
    }
    for media in &message.media {
        let scaled = if media.width > 0.0 {
            media.height * (width / media.width).min(1.0)
        } else {
            MEDIA_MAX_HEIGHT
        };
        height += MEDIA_GAP + scaled.min(MEDIA_MAX_HEIGHT);
    }
    if !message.reactions.is_empty() {
        height += REACTION_ROW_HEIGHT;
    }
    height
}

fn estimate_text_height(content: &str, width: f64) -> f64 {
    if content.is_empty() {
        return ESTIMATED_TEXT_LINE_HEIGHT;
    }

    let chars_per_line = (width / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;

    let mut line_count = 0usize;
    for line in content.lines() {
        let char_count = line.chars().count().max(1);
        line_count += char_count.div_ceil(chars_per_line);
    }

    // A trailing newline still renders an empty line.
    if content.ends_with('\n') {
        line_count += 1;
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1) as f64
}
