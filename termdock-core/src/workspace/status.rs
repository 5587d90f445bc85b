//! Status notifications for the shell
//!
//! Observers are called synchronously after each state change. They are
//! observational only; nothing in the workspace depends on them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dock::PanelId;
use crate::models::SessionId;

/// Something the shell may want to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Human-readable status line
    Message(String),
    /// Recoverable problem worth showing
    Warning(String),
    /// The current layout changed; `None` is the unsaved default
    LayoutChanged {
        /// Layout name
        name: Option<String>,
    },
    /// A panel became active
    ActivePanelChanged {
        /// Panel id
        panel_id: PanelId,
        /// Main window title
        window_title: String,
    },
    /// A terminal process ended and its panel was removed
    SessionExited {
        /// Session that ended
        session_id: SessionId,
    },
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(text) => write!(f, "{text}"),
            Self::Warning(text) => write!(f, "warning: {text}"),
            Self::LayoutChanged { name: Some(name) } => write!(f, "Layout: {name}"),
            Self::LayoutChanged { name: None } => write!(f, "Layout: default"),
            Self::ActivePanelChanged { window_title, .. } => write!(f, "{window_title}"),
            Self::SessionExited { session_id } => write!(f, "Session exited: {session_id}"),
        }
    }
}

/// Receives status notifications
pub trait StatusObserver {
    /// Called after each state change
    fn on_status(&mut self, event: &StatusEvent);
}

impl<F: FnMut(&StatusEvent)> StatusObserver for F {
    fn on_status(&mut self, event: &StatusEvent) {
        self(event);
    }
}

/// Observer that records every event; clones share the record
#[derive(Debug, Clone, Default)]
pub struct StatusLog {
    events: Rc<RefCell<Vec<StatusEvent>>>,
}

impl StatusLog {
    /// Creates an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event
    #[must_use]
    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.borrow().clone()
    }

    /// Recorded status and warning lines only
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                StatusEvent::Message(text) | StatusEvent::Warning(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Most recent status or warning line
    #[must_use]
    pub fn last_message(&self) -> Option<String> {
        self.messages().pop()
    }

    /// Forgets recorded events
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl StatusObserver for StatusLog {
    fn on_status(&mut self, event: &StatusEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
