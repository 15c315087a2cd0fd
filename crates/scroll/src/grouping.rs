use dmview_api::Item;

/// Default longest pause inside one run of messages from the same sender.
pub const DEFAULT_GROUP_GAP_MILLIS: i64 = 120_000;

/// One render-ready row of a message thread.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRow {
    pub item: Item,
    /// Continues the previous row's run, so the attribution is not repeated.
    pub grouped_with_previous: bool,
}

/// Both are messages from one sender, sent in order no more than `max_gap_millis` apart.
pub fn grouped_with_previous(previous: &Item, current: &Item, max_gap_millis: i64) -> bool {
    let (Some(previous), Some(current)) = (previous.as_message(), current.as_message()) else {
        return false;
    };
    if previous.sender != current.sender {
        return false;
    }
    match (previous.sent_time.millis(), current.sent_time.millis()) {
        (Some(before), Some(after)) => (0..=max_gap_millis).contains(&(after - before)),
        _ => false,
    }
}

pub fn message_rows(items: &[Item], max_gap_millis: i64) -> Vec<MessageRow> {
    let mut rows = Vec::with_capacity(items.len());
    let mut previous: Option<&Item> = None;
    for item in items {
        let grouped =
            previous.is_some_and(|previous| grouped_with_previous(previous, item, max_gap_millis));
        rows.push(MessageRow {
            item: item.clone(),
            grouped_with_previous: grouped,
        });
        previous = Some(item);
    }
    rows
}
