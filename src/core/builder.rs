use std::sync::Arc;

use super::component::{Component, ComponentShared};
use super::config::ComponentConfig;
use super::machine::Machine;
use crate::dependencies::{Attach, DependencyShared};
use crate::error::ComponentError;
use crate::events::Bus;
use crate::lifecycle::Lifecycle;
use crate::listeners::StateListener;

/// Builder for constructing a [`Component`].
pub struct ComponentBuilder<I> {
    cfg: ComponentConfig,
    instance: Option<I>,
    dependencies: Vec<Arc<DependencyShared<I>>>,
    listeners: Vec<Arc<dyn StateListener<I>>>,
}

impl<I: Lifecycle> ComponentBuilder<I> {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: ComponentConfig) -> Self {
        Self {
            cfg,
            instance: None,
            dependencies: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Sets the implementation object whose lifecycle the component drives.
    pub fn implementation(mut self, instance: I) -> Self {
        self.instance = Some(instance);
        self
    }

    /// Declares a dependency. Slots keep declaration order.
    ///
    /// A dependency belongs to exactly one component; attaching it twice fails
    /// at [`build`](Self::build).
    pub fn attach<D: Attach<I>>(mut self, dependency: &D) -> Self {
        self.dependencies.push(Arc::clone(dependency.shared()));
        self
    }

    /// Registers a state listener present from the first transition on.
    pub fn listener(mut self, listener: Arc<dyn StateListener<I>>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Builds the component in state `Inactive`.
    ///
    /// ### Errors
    /// - [`ComponentError::MissingImplementation`] if no implementation was set;
    /// - [`ComponentError::AlreadyAttached`] if a dependency is attached twice
    ///   or already belongs to another component.
    pub fn build(self) -> Result<Component<I>, ComponentError> {
        let instance = self
            .instance
            .ok_or(ComponentError::MissingImplementation)?;

        for (i, dependency) in self.dependencies.iter().enumerate() {
            let duplicate = self.dependencies[..i]
                .iter()
                .any(|other| Arc::ptr_eq(other, dependency));
            if duplicate || dependency.is_attached() {
                return Err(already_attached(dependency));
            }
        }

        let name = self.cfg.name_arc();
        let bus = Bus::new(Arc::clone(&name), self.cfg.bus_capacity_clamped());
        let machine = Machine::new(instance, self.dependencies.clone(), self.listeners);
        let shared = Arc::new(ComponentShared::new(name, machine, bus));

        for (slot, dependency) in self.dependencies.iter().enumerate() {
            // Lost a race with another builder attaching the same dependency.
            dependency
                .bind_owner(Arc::downgrade(&shared), slot)
                .map_err(|()| already_attached(dependency))?;
        }

        tracing::debug!(
            component = %shared.name,
            dependencies = self.dependencies.len(),
            "component built"
        );
        Ok(Component { shared })
    }
}

fn already_attached<I>(dependency: &DependencyShared<I>) -> ComponentError {
    ComponentError::AlreadyAttached {
        dependency: dependency.name.to_string(),
    }
}
