//! Core data structures for `termdock`

mod layout;
mod session;

pub use layout::{
    DockArea, DockPlacement, LAYOUT_LIST_TOKEN, LOG_VIEWER_TOKEN, LayoutDescriptor, LayoutTarget,
    PanelKind, PanelPlacement, SESSION_TREE_TOKEN, TERMINAL_TOKEN_PREFIX, layout_name_for_path,
};
pub use session::{Credentials, Protocol, SESSION_ID_SEPARATOR, SessionDescriptor, SessionId};
