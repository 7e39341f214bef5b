//! # LogWriter: transition printer
//!
//! A minimal listener that logs every transition through `tracing`.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! INFO [state-changed] component="client" state=waiting_for_required
//! INFO [state-changed] component="client" state=active
//! ```

use crate::core::{Component, ComponentState};
use crate::listeners::StateListener;

/// Transition writer listener.
#[derive(Default, Debug)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<I> StateListener<I> for LogWriter {
    fn changed(&self, component: &Component<I>, state: ComponentState) {
        match state {
            ComponentState::Active => {
                tracing::info!(component = %component.name(), %state, "[activated]");
            }
            ComponentState::WaitingForRequired | ComponentState::Inactive => {
                tracing::info!(component = %component.name(), %state, "[state-changed]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
