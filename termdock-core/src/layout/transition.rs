//! Layout transition state machine
//!
//! ```text
//!            switch(L)
//!   Idle ──────────────▶ TearingDown ──┬─ L = default ──▶ Resetting ──┐
//!    ▲                                 └─ L saved ──────▶ Restoring ──┤
//!    └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The controller only tracks the state; the workspace drives the steps.
//! [`resolve_layout`] is the persist-token resolver used in `Restoring`.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{LayoutResolutionWarning, TransitionConflict};
use crate::models::{DockPlacement, LayoutDescriptor, LayoutTarget, PanelKind, SessionDescriptor};
use crate::registry::SessionRegistry;

/// Where the layout switch state machine is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransitionState {
    /// A layout is active and nothing is switching
    #[default]
    Idle,
    /// Current panels are being detached and closed
    TearingDown,
    /// A saved layout is being replayed
    Restoring,
    /// The default arrangement is being rebuilt
    Resetting,
}

impl TransitionState {
    /// Whether `next` is a legal successor of this state
    #[must_use]
    pub const fn can_enter(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::TearingDown)
                | (Self::TearingDown, Self::Restoring | Self::Resetting)
                | (Self::Restoring | Self::Resetting, Self::Idle)
        )
    }
}

impl fmt::Display for TransitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::TearingDown => write!(f, "tearing-down"),
            Self::Restoring => write!(f, "restoring"),
            Self::Resetting => write!(f, "resetting"),
        }
    }
}

/// Tracks the transition state and rejects overlapping switches
#[derive(Debug, Default)]
pub struct TransitionController {
    state: TransitionState,
    target: Option<LayoutTarget>,
    completed: u64,
}

impl TransitionController {
    /// Creates an idle controller
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> TransitionState {
        self.state
    }

    /// Whether no transition is running
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == TransitionState::Idle
    }

    /// Target of the running transition
    #[must_use]
    pub const fn target(&self) -> Option<&LayoutTarget> {
        self.target.as_ref()
    }

    /// Number of transitions that ran to completion
    #[must_use]
    pub const fn completed(&self) -> u64 {
        self.completed
    }

    /// Starts a transition towards `target`
    ///
    /// # Errors
    ///
    /// Returns `TransitionConflict` unless the controller is idle.
    pub fn begin(&mut self, target: &LayoutTarget) -> Result<(), TransitionConflict> {
        if !self.is_idle() {
            return Err(TransitionConflict {
                requested: target.to_string(),
            });
        }
        self.target = Some(target.clone());
        self.enter(TransitionState::TearingDown);
        Ok(())
    }

    /// Moves to the next step
    ///
    /// An illegal edge is a sequencing bug; it is logged and applied so the
    /// transition can still reach `Idle`.
    pub fn enter(&mut self, next: TransitionState) {
        if !self.state.can_enter(next) {
            tracing::error!(from = %self.state, to = %next, "Illegal layout transition step");
        }
        tracing::debug!(from = %self.state, to = %next, "Layout transition step");
        self.state = next;
    }

    /// Returns to `Idle`
    pub fn finish(&mut self) {
        self.enter(TransitionState::Idle);
        self.target = None;
        self.completed += 1;
    }
}

/// One panel to rebuild while restoring a layout
#[derive(Debug, Clone)]
pub enum RestoreStep {
    /// Recreate or reattach a tool panel
    Tool {
        /// Tool kind
        kind: PanelKind,
        /// Saved placement
        placement: DockPlacement,
    },
    /// Launch a terminal for a registered session
    Terminal {
        /// Resolved session
        descriptor: Arc<SessionDescriptor>,
        /// Saved placement
        placement: DockPlacement,
    },
}

/// Resolves a saved layout's persist tokens, in saved order
///
/// Unknown tokens and sessions that are no longer registered are skipped
/// with a warning. Repeated tokens are dropped: each tool panel and each
/// session appears at most once.
#[must_use]
pub fn resolve_layout(
    layout: &LayoutDescriptor,
    registry: &SessionRegistry,
) -> (Vec<RestoreStep>, Vec<LayoutResolutionWarning>) {
    let mut steps = Vec::with_capacity(layout.panels.len());
    let mut warnings = Vec::new();
    let mut seen: HashSet<PanelKind> = HashSet::new();

    for record in &layout.panels {
        let Some(kind) = record.kind() else {
            tracing::warn!(layout = %layout.name, token = %record.token, "Unknown panel token");
            warnings.push(LayoutResolutionWarning::UnknownToken(record.token.clone()));
            continue;
        };
        if !seen.insert(kind.clone()) {
            tracing::debug!(layout = %layout.name, kind = %kind, "Duplicate panel skipped");
            continue;
        }

        match kind {
            PanelKind::Terminal { session_id } => match registry.resolve(&session_id) {
                Ok(descriptor) => steps.push(RestoreStep::Terminal {
                    descriptor,
                    placement: record.placement,
                }),
                Err(_) => {
                    tracing::warn!(
                        layout = %layout.name,
                        session_id = %session_id,
                        "Layout references a session that no longer exists"
                    );
                    warnings.push(LayoutResolutionWarning::MissingSession(session_id));
                }
            },
            tool => steps.push(RestoreStep::Tool {
                kind: tool,
                placement: record.placement,
            }),
        }
    }

    (steps, warnings)
}
