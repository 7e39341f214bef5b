//! Collaborator slots of a component.
//!
//! - [`Dependency`] tracks a set of bound service events (`add`/`remove`/`change`);
//! - [`ConfigurationDependency`] tracks at most one configuration snapshot (`updated`).
//!
//! Both are built standalone, attached to exactly one component through
//! [`ComponentBuilder::attach`](crate::ComponentBuilder::attach), and from then
//! on forward every producer call to that component's serialized queue.

mod configuration;
mod dependency;
mod shared;

pub use configuration::{ConfigurationDependency, ConfigurationDependencyBuilder};
pub use dependency::{Dependency, DependencyBuilder};
pub use shared::Attach;

pub(crate) use shared::{DependencyShared, Hooks, sealed};
