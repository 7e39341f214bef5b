//! # Service dependency.
//!
//! A [`Dependency`] is one collaborator slot of a component. Producers (a
//! service registry, a test harness) feed it [`Event`]s from any thread; the
//! owning component applies them in its drain loop and invokes the callbacks
//! bound at build time.
//!
//! ## Availability
//! ```text
//! bound: 0 ──add──► 1 ──add──► n        available == bound > 0
//!        ◄─remove── 1 ◄─remove─ n
//! ```
//! - 0→1 publishes `DependencyAvailable`; 1→0 publishes `DependencyUnavailable`.
//! - A required dependency gates activation: its loss deactivates an `Active`
//!   owner before the remove callback of the event that caused it.
//! - `add` of a bound id, `remove` of an unbound id and `change` of an unbound
//!   id are no-ops without callbacks.
//!
//! ## Example
//! ```rust
//! use depvisor::{Component, ComponentConfig, ComponentState, Dependency, Event, Lifecycle};
//!
//! struct Client {
//!     backends: usize,
//! }
//! impl Lifecycle for Client {}
//!
//! let backend = Dependency::builder("backend")
//!     .required(true)
//!     .on_add(|c: &mut Client, _| {
//!         c.backends += 1;
//!         Ok(())
//!     })
//!     .on_remove(|c: &mut Client, _| {
//!         c.backends -= 1;
//!         Ok(())
//!     })
//!     .build();
//!
//! let client = Component::builder(ComponentConfig::named("client"))
//!     .implementation(Client { backends: 0 })
//!     .attach(&backend)
//!     .build()
//!     .unwrap();
//!
//! client.start();
//! assert_eq!(client.state(), ComponentState::WaitingForRequired);
//!
//! backend.add(Event::new(1)).unwrap();
//! assert_eq!(client.state(), ComponentState::Active);
//! assert!(backend.is_available());
//! ```

use std::fmt;
use std::sync::Arc;

use super::shared::{Attach, BindFn, DependencyShared, Hooks, sealed::Sealed};
use crate::core::Command;
use crate::error::{CallbackError, ComponentError};
use crate::events::Event;
use crate::lifecycle::Lifecycle;

/// Handle to a service dependency. Cloning yields another handle to the same slot.
pub struct Dependency<I> {
    shared: Arc<DependencyShared<I>>,
}

impl<I> Clone for Dependency<I> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<I> Dependency<I> {
    /// Dependency name, used in logs and notices.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether the dependency gates activation of its component.
    pub fn is_required(&self) -> bool {
        self.shared.required
    }

    /// Snapshot of the number of bound events.
    pub fn bound_count(&self) -> usize {
        self.shared.bound()
    }

    /// Snapshot of availability (`bound_count() > 0`).
    pub fn is_available(&self) -> bool {
        self.bound_count() > 0
    }
}

impl<I: Lifecycle> Dependency<I> {
    /// Creates a builder; the dependency is optional unless
    /// [`required(true)`](DependencyBuilder::required) is set.
    pub fn builder(name: impl Into<Arc<str>>) -> DependencyBuilder<I> {
        DependencyBuilder {
            name: name.into(),
            required: false,
            on_add: None,
            on_remove: None,
            on_change: None,
        }
    }

    /// Binds `event`. Ignored if an event with the same id is already bound.
    pub fn add(&self, event: Event) -> Result<(), ComponentError> {
        self.submit(|slot| Command::Add { slot, event })
    }

    /// Unbinds the event with `event`'s id. Ignored if it is not bound.
    pub fn remove(&self, event: Event) -> Result<(), ComponentError> {
        self.submit(|slot| Command::Remove { slot, event })
    }

    /// Replaces the bound event with the same id. Ignored if it is not bound.
    pub fn change(&self, event: Event) -> Result<(), ComponentError> {
        self.submit(|slot| Command::Change { slot, event })
    }

    fn submit(&self, command: impl FnOnce(usize) -> Command<I>) -> Result<(), ComponentError> {
        let (component, slot) = self.shared.owner().ok_or(ComponentError::Detached)?;
        component.submit(command(slot));
        Ok(())
    }
}

impl<I> Sealed<I> for Dependency<I> {
    fn shared(&self) -> &Arc<DependencyShared<I>> {
        &self.shared
    }
}

impl<I> Attach<I> for Dependency<I> {}

impl<I> fmt::Debug for Dependency<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("name", &self.name())
            .field("required", &self.is_required())
            .field("bound", &self.bound_count())
            .finish()
    }
}

/// Builder for a [`Dependency`].
pub struct DependencyBuilder<I> {
    name: Arc<str>,
    required: bool,
    on_add: Option<BindFn<I>>,
    on_remove: Option<BindFn<I>>,
    on_change: Option<BindFn<I>>,
}

impl<I: Lifecycle> DependencyBuilder<I> {
    /// Whether the component may only be active while this dependency is available.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Callback for a newly bound event.
    ///
    /// An `Err` is reported as a callback failure; the event stays bound.
    pub fn on_add<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut I, &Event) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.on_add = Some(Box::new(f));
        self
    }

    /// Callback for an unbound event; receives the event as it was stored.
    pub fn on_remove<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut I, &Event) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.on_remove = Some(Box::new(f));
        self
    }

    /// Callback for a bound event whose payload was replaced.
    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut I, &Event) -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Dependency<I> {
        let hooks = Hooks::Service {
            on_add: self.on_add,
            on_remove: self.on_remove,
            on_change: self.on_change,
        };
        Dependency {
            shared: Arc::new(DependencyShared::new(self.name, self.required, hooks)),
        }
    }
}
