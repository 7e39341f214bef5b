//! State shared between a dependency handle and its owning component.
//!
//! The bound events themselves live in the component's drain-owned state
//! machine; this type only carries what producers and snapshot readers need:
//! the callbacks, the owner link, and lock-free snapshots.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use arc_swap::ArcSwapOption;

use crate::core::{Component, ComponentShared};
use crate::error::{CallbackError, ConfigurationError};
use crate::events::{Configuration, Event};

/// Service binding callback.
pub(crate) type BindFn<I> = Box<dyn Fn(&mut I, &Event) -> Result<(), CallbackError> + Send + Sync>;

/// Configuration callback; `None` means the configuration was removed.
pub(crate) type UpdatedFn<I> =
    Box<dyn Fn(&mut I, Option<&Configuration>) -> Result<(), ConfigurationError> + Send + Sync>;

pub(crate) enum Hooks<I> {
    Service {
        on_add: Option<BindFn<I>>,
        on_remove: Option<BindFn<I>>,
        on_change: Option<BindFn<I>>,
    },
    Configuration {
        on_updated: Option<UpdatedFn<I>>,
    },
}

pub(crate) struct Owner<I> {
    component: Weak<ComponentShared<I>>,
    slot: usize,
}

/// Dependency state reachable from both the handle and the component.
pub struct DependencyShared<I> {
    pub(crate) name: Arc<str>,
    pub(crate) required: bool,
    pub(crate) hooks: Hooks<I>,
    owner: OnceLock<Owner<I>>,
    bound: AtomicUsize,
    configuration: ArcSwapOption<Configuration>,
}

impl<I> DependencyShared<I> {
    pub(crate) fn new(name: Arc<str>, required: bool, hooks: Hooks<I>) -> Self {
        Self {
            name,
            required,
            hooks,
            owner: OnceLock::new(),
            bound: AtomicUsize::new(0),
            configuration: ArcSwapOption::empty(),
        }
    }

    /// Links this dependency to its component; fails if it already has one.
    pub(crate) fn bind_owner(
        &self,
        component: Weak<ComponentShared<I>>,
        slot: usize,
    ) -> Result<(), ()> {
        self.owner
            .set(Owner { component, slot })
            .map_err(|_| ())
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.owner.get().is_some()
    }

    /// The owning component and this dependency's slot in it, if still alive.
    pub(crate) fn owner(&self) -> Option<(Component<I>, usize)> {
        let owner = self.owner.get()?;
        let shared = owner.component.upgrade()?;
        Some((Component { shared }, owner.slot))
    }

    pub(crate) fn store_bound(&self, count: usize) {
        self.bound.store(count, Ordering::Release);
    }

    pub(crate) fn bound(&self) -> usize {
        self.bound.load(Ordering::Acquire)
    }

    pub(crate) fn store_configuration(&self, configuration: Option<Arc<Configuration>>) {
        self.configuration.store(configuration);
    }

    pub(crate) fn configuration(&self) -> Option<Arc<Configuration>> {
        self.configuration.load_full()
    }
}

pub(crate) mod sealed {
    use std::sync::Arc;

    use super::DependencyShared;

    pub trait Sealed<I> {
        fn shared(&self) -> &Arc<DependencyShared<I>>;
    }
}

/// Anything that can be attached to a [`ComponentBuilder`](crate::ComponentBuilder):
/// [`Dependency`](crate::Dependency) and [`ConfigurationDependency`](crate::ConfigurationDependency).
pub trait Attach<I>: sealed::Sealed<I> {}
