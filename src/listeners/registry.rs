use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use super::listener::StateListener;
use crate::core::{Component, ComponentState};
use crate::error::panic_reason;
use crate::events::NoticeKind;

/// Listeners of one component, owned by its drain loop.
pub(crate) struct ListenerRegistry<I> {
    listeners: Vec<Arc<dyn StateListener<I>>>,
}

impl<I: 'static> ListenerRegistry<I> {
    pub(crate) fn new(listeners: Vec<Arc<dyn StateListener<I>>>) -> Self {
        let mut registry = Self {
            listeners: Vec::with_capacity(listeners.len()),
        };
        for listener in listeners {
            registry.add(listener);
        }
        registry
    }

    /// Adds a listener; adding the same `Arc` twice is a no-op.
    pub(crate) fn add(&mut self, listener: Arc<dyn StateListener<I>>) {
        if !self.contains(&listener) {
            self.listeners.push(listener);
        }
    }

    pub(crate) fn remove(&mut self, listener: &Arc<dyn StateListener<I>>) {
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
    }

    fn contains(&self, listener: &Arc<dyn StateListener<I>>) -> bool {
        self.listeners.iter().any(|l| Arc::ptr_eq(l, listener))
    }

    /// Delivers `state` to every listener in registration order.
    pub(crate) fn notify(&self, component: &Component<I>, state: ComponentState) {
        for listener in &self.listeners {
            let res = catch_unwind(AssertUnwindSafe(|| listener.changed(component, state)));
            if let Err(panic) = res {
                let reason = panic_reason(panic.as_ref());
                tracing::warn!(
                    component = %component.name(),
                    listener = listener.name(),
                    %state,
                    %reason,
                    "state listener panicked"
                );
                let bus = component.bus();
                bus.publish(
                    bus.notice(NoticeKind::ListenerPanicked)
                        .with_state(state)
                        .with_reason(format!("listener={} reason={reason}", listener.name())),
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}
