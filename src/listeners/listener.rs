//! # State listener trait.
//!
//! Provides [`StateListener`], the observer notified on every component
//! transition.
//!
//! ## Rules
//! - Called synchronously from the component's drain loop, in transition
//!   order, before the next command is applied.
//! - Never called concurrently for the same component.
//! - May call back into the component (`start`, `stop`, `add_state_listener`,
//!   dependency `add`/`remove`): those calls are queued behind the current one.
//! - Must not block. Hand long work to an [`Offload`](crate::Offload).
//! - A panic is caught and published as `NoticeKind::ListenerPanicked`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use depvisor::{Component, ComponentState, Lifecycle, StateListener};
//!
//! struct Client;
//! impl Lifecycle for Client {}
//!
//! let on_active: Arc<dyn StateListener<Client>> =
//!     Arc::new(|c: &Component<Client>, state: ComponentState| {
//!         if state == ComponentState::Active {
//!             println!("{} is up", c.name());
//!         }
//!     });
//! # let _ = on_active;
//! ```

use crate::core::{Component, ComponentState};

/// Observer of component state transitions.
pub trait StateListener<I>: Send + Sync + 'static {
    /// Called with the component and the state it just entered.
    fn changed(&self, component: &Component<I>, state: ComponentState);

    /// Returns the listener name used in logs and notices.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose: override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<I, F> StateListener<I> for F
where
    F: Fn(&Component<I>, ComponentState) + Send + Sync + 'static,
{
    fn changed(&self, component: &Component<I>, state: ComponentState) {
        self(component, state)
    }
}
