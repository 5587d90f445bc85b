//! Command broadcast
//!
//! Types one line of text into every docked terminal, in dock order,
//! regardless of which panel has focus.

use crate::bridge::ProcessBridge;
use crate::dock::TerminalPanel;
use crate::models::SessionId;
use crate::platform::{InputEvent, InputKey};

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Sessions that received the command, in delivery order
    pub delivered: Vec<SessionId>,
    /// Sessions skipped because their process had exited
    pub skipped_dead: Vec<SessionId>,
    /// Sessions where injection failed, with the error text
    pub failed: Vec<(SessionId, String)>,
}

impl BroadcastReport {
    /// Number of panels that received the command
    #[must_use]
    pub fn sent(&self) -> usize {
        self.delivered.len()
    }

    /// Status line for the shell
    #[must_use]
    pub fn status(&self) -> String {
        format!("Sent command to {} session(s)", self.sent())
    }
}

/// Forwards a line of text to terminals as synthetic keystrokes
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandBroadcaster;

impl CommandBroadcaster {
    /// Creates a broadcaster
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Input events for one submitted line: every character, then Enter
    #[must_use]
    pub fn line_events(text: &str) -> Vec<InputEvent> {
        text.chars()
            .map(InputEvent::Char)
            .chain(std::iter::once(InputEvent::Key(InputKey::Enter)))
            .collect()
    }

    /// Sends `text` to each panel in the order given
    ///
    /// Empty text is a no-op. Dead panels are skipped and not counted; a
    /// failed injection is logged and not counted.
    pub fn broadcast<'a>(
        &self,
        bridge: &ProcessBridge,
        panels: impl IntoIterator<Item = &'a mut TerminalPanel>,
        text: &str,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        if text.is_empty() {
            return report;
        }

        let events = Self::line_events(text);
        for panel in panels {
            let session_id = panel.session_id().clone();
            match panel.send_input(bridge, &events) {
                Ok(true) => report.delivered.push(session_id),
                Ok(false) => {
                    tracing::debug!(session_id = %session_id, "Skipping exited session");
                    report.skipped_dead.push(session_id);
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Failed to send command");
                    report.failed.push((session_id, e.to_string()));
                }
            }
        }

        tracing::info!(
            sent = report.sent(),
            skipped = report.skipped_dead.len(),
            failed = report.failed.len(),
            "Broadcast command"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_events_end_with_enter() {
        assert_eq!(
            CommandBroadcaster::line_events("ls"),
            vec![
                InputEvent::Char('l'),
                InputEvent::Char('s'),
                InputEvent::Key(InputKey::Enter)
            ]
        );
    }

    #[test]
    fn line_events_keep_unicode_chars() {
        let events = CommandBroadcaster::line_events("é ✓");
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], InputEvent::Char('✓'));
    }

    #[test]
    fn status_counts_sessions() {
        let report = BroadcastReport {
            delivered: vec![SessionId::from("a"), SessionId::from("b")],
            ..BroadcastReport::default()
        };
        assert_eq!(report.status(), "Sent command to 2 session(s)");
    }
}
