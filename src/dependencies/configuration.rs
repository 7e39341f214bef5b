//! # Configuration dependency.
//!
//! A [`ConfigurationDependency`] binds at most one [`Configuration`] snapshot,
//! delivered by a configuration admin through [`updated`](ConfigurationDependency::updated).
//!
//! ## Update protocol
//! ```text
//! updated(Some(cfg)) ─► queue ─► on_updated(Some(&cfg))
//!                                   ├─ Ok  ─► replace bound snapshot ─► (0→1: available) ─► Ok(())
//!                                   └─ Err ─► nothing changes ─────────────────────────────► Err(Rejected)
//!
//! updated(None) ─► queue ─► unbind ─► (required && Active: stop, destroy) ─► on_updated(None) ─► Ok(())
//! ```
//!
//! `updated` blocks until its update was applied so the consumer's verdict can
//! be returned. From inside a callback of the owning component it returns
//! [`ConfigurationError::Reentrant`] instead of waiting on itself.

use std::fmt;
use std::sync::{Arc, mpsc};

use super::shared::{Attach, DependencyShared, Hooks, UpdatedFn, sealed::Sealed};
use crate::core::Command;
use crate::error::ConfigurationError;
use crate::events::Configuration;
use crate::lifecycle::Lifecycle;

/// Handle to a configuration dependency.
pub struct ConfigurationDependency<I> {
    shared: Arc<DependencyShared<I>>,
}

impl<I> Clone for ConfigurationDependency<I> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<I> ConfigurationDependency<I> {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_required(&self) -> bool {
        self.shared.required
    }

    /// Snapshot of the bound configuration, if any.
    pub fn configuration(&self) -> Option<Arc<Configuration>> {
        self.shared.configuration()
    }

    /// Snapshot of availability.
    pub fn is_available(&self) -> bool {
        self.shared.bound() > 0
    }
}

impl<I: Lifecycle> ConfigurationDependency<I> {
    /// Creates a builder; configuration dependencies are required by default.
    pub fn builder(name: impl Into<Arc<str>>) -> ConfigurationDependencyBuilder<I> {
        ConfigurationDependencyBuilder {
            name: name.into(),
            required: true,
            on_updated: None,
        }
    }

    /// Proposes a new configuration (`Some`) or withdraws the current one (`None`).
    ///
    /// Returns once the update was applied by the owning component.
    ///
    /// ### Errors
    /// - [`ConfigurationError::Rejected`] (or whatever the callback returned)
    ///   when `on_updated` refused the configuration; nothing changed;
    /// - [`ConfigurationError::Reentrant`] when called from inside the owning
    ///   component's drain loop; nothing was queued;
    /// - [`ConfigurationError::Detached`] when not attached to a live component;
    /// - [`ConfigurationError::Abandoned`] when the update was dropped unapplied.
    pub fn updated(&self, configuration: Option<Configuration>) -> Result<(), ConfigurationError> {
        let (component, slot) = self.shared.owner().ok_or(ConfigurationError::Detached)?;
        if component.shared.queue.is_drained_by_current_thread() {
            tracing::warn!(
                component = %component.name(),
                dependency = %self.shared.name,
                "configuration update from inside the drain loop refused"
            );
            return Err(ConfigurationError::Reentrant);
        }

        let (reply, outcome) = mpsc::sync_channel(1);
        component.submit(Command::Configure {
            slot,
            configuration,
            reply,
        });
        outcome.recv().unwrap_or(Err(ConfigurationError::Abandoned))
    }
}

impl<I> Sealed<I> for ConfigurationDependency<I> {
    fn shared(&self) -> &Arc<DependencyShared<I>> {
        &self.shared
    }
}

impl<I> Attach<I> for ConfigurationDependency<I> {}

impl<I> fmt::Debug for ConfigurationDependency<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationDependency")
            .field("name", &self.name())
            .field("required", &self.is_required())
            .field("configuration", &self.configuration())
            .finish()
    }
}

/// Builder for a [`ConfigurationDependency`].
pub struct ConfigurationDependencyBuilder<I> {
    name: Arc<str>,
    required: bool,
    on_updated: Option<UpdatedFn<I>>,
}

impl<I: Lifecycle> ConfigurationDependencyBuilder<I> {
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Callback receiving every proposed configuration, and `None` on withdrawal.
    ///
    /// Returning `Err` for a proposed configuration rejects it: the previous
    /// configuration stays bound and the error is returned from `updated`.
    pub fn on_updated<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut I, Option<&Configuration>) -> Result<(), ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.on_updated = Some(Box::new(f));
        self
    }

    pub fn build(self) -> ConfigurationDependency<I> {
        let hooks = Hooks::Configuration {
            on_updated: self.on_updated,
        };
        ConfigurationDependency {
            shared: Arc::new(DependencyShared::new(self.name, self.required, hooks)),
        }
    }
}
