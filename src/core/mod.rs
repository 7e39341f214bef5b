//! Runtime core: serialized queue, state machine and the component handle.
//!
//! The public API from this module is [`Component`] (with its
//! [`ComponentBuilder`]), [`ComponentConfig`] and [`ComponentState`].
//!
//! Internal modules:
//! - [`queue`]: per-component serialized queue with a single active drainer;
//! - [`machine`]: applies drained commands, drives lifecycle callbacks and transitions;
//! - [`component`]: the cloneable handle producers and listeners hold;
//! - [`builder`]: assembles a component and attaches its dependencies;
//! - [`state`]: component states and their lock-free snapshot.

mod builder;
mod component;
mod config;
mod machine;
mod queue;
mod state;

pub use builder::ComponentBuilder;
pub use component::Component;
pub use config::ComponentConfig;
pub use state::ComponentState;

pub(crate) use component::ComponentShared;
pub(crate) use machine::Command;
