pub mod anchor;
pub mod controller;
pub mod error;
pub mod grouping;
pub mod history;
pub mod layout;
pub mod paged;
pub mod window;

pub use anchor::{ItemBounds, PositionProvider, ScrollAnchor, Viewport, nearest_index};
pub use controller::{
    ControllerConfig, DEFAULT_EDGE_THRESHOLD, LoadTicket, MessageListController, ThreadQuery,
};
pub use error::{ControllerError, ControllerResult};
pub use grouping::{DEFAULT_GROUP_GAP_MILLIS, MessageRow, grouped_with_previous, message_rows};
pub use history::{HistoryAction, Location, NavigationHistory, Subscription, Transition};
pub use layout::{EstimatedLayout, LayoutMetrics};
pub use paged::{PageRequest, PagedList};
pub use window::{
    DEFAULT_MAX_WINDOW, Direction, LoadRequest, PageApplied, PendingLoad, StartingPlace,
    WindowConfig, WindowItem, WindowedList,
};
