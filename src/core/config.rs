//! # Per-component configuration.
//!
//! Provides [`ComponentConfig`], the settings a component is built with:
//! `Component::builder(config)`.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`ComponentConfig::bus_capacity_clamped`]
//! - empty `name` → replaced by `"component"`

use std::sync::Arc;

/// Settings for one component.
///
/// ## Field semantics
/// - `name`: label used in logs and in every [`Notice`](crate::Notice) the component emits
/// - `bus_capacity`: notice bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct ComponentConfig {
    /// Component name used in logs and notices.
    pub name: String,

    /// Capacity of the notice bus broadcast ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` notices observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl ComponentConfig {
    /// Default configuration with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the name as shared text, falling back to `"component"` when empty.
    pub(crate) fn name_arc(&self) -> Arc<str> {
        if self.name.is_empty() {
            Arc::from("component")
        } else {
            Arc::from(self.name.as_str())
        }
    }
}

impl Default for ComponentConfig {
    /// Default configuration:
    ///
    /// - `name = "component"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            name: "component".to_string(),
            bus_capacity: 1024,
        }
    }
}
