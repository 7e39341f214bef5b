//! # Component states.
//!
//! ```text
//!  Inactive ──start()──► WaitingForRequired ──all required available──► Active
//!     ▲                        │      ▲                                   │
//!     │                        │      └──── required dependency lost ─────┤
//!     └──────── stop() ────────┴──────────────────── stop() ──────────────┘
//! ```
//!
//! [`AtomicState`] is the snapshot read path: the drain loop stores every
//! transition into it so other threads can read the state without joining the
//! drain protocol.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// State of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentState {
    /// Not started, or stopped.
    #[default]
    Inactive,
    /// Started, but at least one required dependency is unavailable.
    WaitingForRequired,
    /// Started, every required dependency is available and the start callback has returned.
    Active,
}

impl ComponentState {
    /// Stable, human-readable label for logs.
    pub const fn label(self) -> &'static str {
        match self {
            ComponentState::Inactive => "inactive",
            ComponentState::WaitingForRequired => "waiting_for_required",
            ComponentState::Active => "active",
        }
    }

    /// True once `start()` has been applied and until `stop()` is.
    pub const fn is_started(self) -> bool {
        !matches!(self, ComponentState::Inactive)
    }

    const fn to_u8(self) -> u8 {
        match self {
            ComponentState::Inactive => 0,
            ComponentState::WaitingForRequired => 1,
            ComponentState::Active => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ComponentState::WaitingForRequired,
            2 => ComponentState::Active,
            _ => ComponentState::Inactive,
        }
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lock-free snapshot of a [`ComponentState`].
#[derive(Debug, Default)]
pub(crate) struct AtomicState(AtomicU8);

impl AtomicState {
    pub(crate) fn load(&self) -> ComponentState {
        ComponentState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ComponentState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }
}
