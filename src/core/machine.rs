//! # Component state machine.
//!
//! [`Machine`] owns everything the drain loop mutates: the implementation
//! instance, the bound events of every dependency slot, the current state and
//! the listener registry. It is reached only through the component's
//! [`SerialQueue`](super::queue::SerialQueue), one [`Command`] at a time.
//!
//! ## Flow of one command
//! ```text
//! Command ─► apply()
//!              ├─ Start/Stop ─────────────► transition(..) ─► reconcile()
//!              ├─ Add/Remove/Change ──────► bound set ─► callbacks ─► availability_changed()
//!              ├─ Configure ──────────────► on_updated ─► bound set ─► reply
//!              └─ Add/RemoveListener ─────► registry
//!
//! reconcile():
//!   WaitingForRequired && all required available ─► Lifecycle::start ─► Active
//!   Active && some required unavailable ─► Lifecycle::stop ─► destroy ─► WaitingForRequired
//! ```
//!
//! ## Rules
//! - A failing (or panicking) callback never aborts the transition it belongs
//!   to; it is logged and published as [`NoticeKind::CallbackFailed`].
//! - Losing a required dependency deactivates the component *before* that
//!   dependency's remove callback runs.
//! - Every transition is stored into the state snapshot, published on the bus
//!   and delivered to listeners before the next command is applied.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, mpsc};

use crate::core::{Component, ComponentState};
use crate::dependencies::{DependencyShared, Hooks};
use crate::error::{CallbackError, ConfigurationError, panic_reason};
use crate::events::{Configuration, Event, EventId, NoticeKind};
use crate::lifecycle::Lifecycle;
use crate::listeners::{ListenerRegistry, StateListener};

/// One unit of work for a component's drain loop.
pub(crate) enum Command<I> {
    Start,
    Stop,
    Add {
        slot: usize,
        event: Event,
    },
    Change {
        slot: usize,
        event: Event,
    },
    Remove {
        slot: usize,
        event: Event,
    },
    Configure {
        slot: usize,
        configuration: Option<Configuration>,
        reply: mpsc::SyncSender<Result<(), ConfigurationError>>,
    },
    AddListener(Arc<dyn StateListener<I>>),
    RemoveListener(Arc<dyn StateListener<I>>),
}

struct Slot<I> {
    dependency: Arc<DependencyShared<I>>,
    bound: BTreeMap<EventId, Event>,
}

impl<I> Slot<I> {
    fn publish_count(&self) {
        self.dependency.store_bound(self.bound.len());
    }
}

/// Drain-owned component state.
pub(crate) struct Machine<I> {
    instance: I,
    slots: Vec<Slot<I>>,
    listeners: ListenerRegistry<I>,
    state: ComponentState,
}

impl<I: Lifecycle> Machine<I> {
    pub(crate) fn new(
        instance: I,
        dependencies: Vec<Arc<DependencyShared<I>>>,
        listeners: Vec<Arc<dyn StateListener<I>>>,
    ) -> Self {
        Self {
            instance,
            slots: dependencies
                .into_iter()
                .map(|dependency| Slot {
                    dependency,
                    bound: BTreeMap::new(),
                })
                .collect(),
            listeners: ListenerRegistry::new(listeners),
            state: ComponentState::Inactive,
        }
    }

    /// Applies one command. `cx` is the handle of the component being drained.
    pub(crate) fn apply(&mut self, command: Command<I>, cx: &Component<I>) {
        match command {
            Command::Start => self.start(cx),
            Command::Stop => self.stop(cx),
            Command::Add { slot, event } => self.add(slot, event, cx),
            Command::Change { slot, event } => self.change(slot, event, cx),
            Command::Remove { slot, event } => self.remove(slot, event, cx),
            Command::Configure {
                slot,
                configuration,
                reply,
            } => {
                let outcome = match configuration {
                    Some(configuration) => self.configure(slot, configuration, cx),
                    None => {
                        self.unconfigure(slot, cx);
                        Ok(())
                    }
                };
                // The caller may have given up waiting; nothing to do then.
                let _ = reply.send(outcome);
            }
            Command::AddListener(listener) => self.listeners.add(listener),
            Command::RemoveListener(listener) => self.listeners.remove(&listener),
        }
    }

    fn start(&mut self, cx: &Component<I>) {
        if self.state != ComponentState::Inactive {
            return;
        }
        self.transition(ComponentState::WaitingForRequired, cx);
        self.reconcile(cx);
    }

    fn stop(&mut self, cx: &Component<I>) {
        match self.state {
            ComponentState::Inactive => {}
            ComponentState::WaitingForRequired => {
                self.transition(ComponentState::Inactive, cx);
            }
            ComponentState::Active => {
                self.deactivate(cx);
                self.transition(ComponentState::Inactive, cx);
            }
        }
    }

    fn add(&mut self, slot: usize, event: Event, cx: &Component<I>) {
        let Some(s) = self.slots.get_mut(slot) else {
            return;
        };
        if s.bound.contains_key(&event.id()) {
            tracing::trace!(
                component = %cx.name(),
                dependency = %s.dependency.name,
                event = %event.id(),
                "add of an already bound event ignored"
            );
            return;
        }
        s.bound.insert(event.id(), event.clone());
        s.publish_count();
        let became_available = s.bound.len() == 1;
        let dependency = Arc::clone(&s.dependency);

        if let Hooks::Service {
            on_add: Some(on_add),
            ..
        } = &dependency.hooks
        {
            let res = guarded(|| on_add(&mut self.instance, &event));
            self.report(res, "add", Some(&*dependency), cx);
        }
        if became_available {
            self.availability_changed(&dependency, true, cx);
        }
    }

    fn change(&mut self, slot: usize, event: Event, cx: &Component<I>) {
        let Some(s) = self.slots.get_mut(slot) else {
            return;
        };
        let Some(stored) = s.bound.get_mut(&event.id()) else {
            return;
        };
        *stored = event.clone();
        let dependency = Arc::clone(&s.dependency);

        if let Hooks::Service {
            on_change: Some(on_change),
            ..
        } = &dependency.hooks
        {
            let res = guarded(|| on_change(&mut self.instance, &event));
            self.report(res, "change", Some(&*dependency), cx);
        }
    }

    fn remove(&mut self, slot: usize, event: Event, cx: &Component<I>) {
        let Some(s) = self.slots.get_mut(slot) else {
            return;
        };
        let Some(stored) = s.bound.remove(&event.id()) else {
            return;
        };
        s.publish_count();
        let became_unavailable = s.bound.is_empty();
        let dependency = Arc::clone(&s.dependency);

        if became_unavailable {
            self.availability_changed(&dependency, false, cx);
        }
        if let Hooks::Service {
            on_remove: Some(on_remove),
            ..
        } = &dependency.hooks
        {
            let res = guarded(|| on_remove(&mut self.instance, &stored));
            self.report(res, "remove", Some(&*dependency), cx);
        }
    }

    fn configure(
        &mut self,
        slot: usize,
        configuration: Configuration,
        cx: &Component<I>,
    ) -> Result<(), ConfigurationError> {
        let Some(s) = self.slots.get(slot) else {
            return Err(ConfigurationError::Detached);
        };
        let dependency = Arc::clone(&s.dependency);
        let event = Event::with_configuration(configuration);

        if let Hooks::Configuration {
            on_updated: Some(on_updated),
        } = &dependency.hooks
        {
            let proposed = event.configuration().map(|c| &**c);
            let res = catch_unwind(AssertUnwindSafe(|| on_updated(&mut self.instance, proposed)))
                .unwrap_or_else(|panic| {
                    Err(ConfigurationError::rejected(format!(
                        "callback panicked: {}",
                        panic_reason(panic.as_ref())
                    )))
                })
                // Only the drain loop may report a runtime outcome.
                .map_err(|err| match err {
                    ConfigurationError::Rejected { .. } => err,
                    other => ConfigurationError::rejected(other.to_string()),
                });
            if let Err(err) = res {
                tracing::warn!(
                    component = %cx.name(),
                    dependency = %dependency.name,
                    error = %err,
                    "configuration rejected; bound state unchanged"
                );
                let bus = cx.bus();
                bus.publish(
                    bus.notice(NoticeKind::ConfigurationRejected)
                        .with_dependency(dependency.name.clone())
                        .with_reason(err.to_string()),
                );
                return Err(err);
            }
        }

        let s = &mut self.slots[slot];
        let became_available = s.bound.is_empty();
        s.bound.clear();
        s.bound.insert(event.id(), event.clone());
        s.publish_count();
        dependency.store_configuration(event.configuration().cloned());

        if became_available {
            self.availability_changed(&dependency, true, cx);
        }
        Ok(())
    }

    fn unconfigure(&mut self, slot: usize, cx: &Component<I>) {
        let Some(s) = self.slots.get_mut(slot) else {
            return;
        };
        if s.bound.is_empty() {
            return;
        }
        s.bound.clear();
        s.publish_count();
        let dependency = Arc::clone(&s.dependency);
        dependency.store_configuration(None);

        self.availability_changed(&dependency, false, cx);
        if let Hooks::Configuration {
            on_updated: Some(on_updated),
        } = &dependency.hooks
        {
            let res = guarded(|| {
                on_updated(&mut self.instance, None)
                    .map_err(|err| CallbackError::failed(err.to_string()))
            });
            self.report(res, "updated", Some(&*dependency), cx);
        }
    }

    fn availability_changed(
        &mut self,
        dependency: &DependencyShared<I>,
        available: bool,
        cx: &Component<I>,
    ) {
        let kind = if available {
            NoticeKind::DependencyAvailable
        } else {
            NoticeKind::DependencyUnavailable
        };
        tracing::debug!(
            component = %cx.name(),
            dependency = %dependency.name,
            required = dependency.required,
            available,
            "dependency availability changed"
        );
        let bus = cx.bus();
        bus.publish(bus.notice(kind).with_dependency(dependency.name.clone()));
        if dependency.required {
            self.reconcile(cx);
        }
    }

    /// Moves between `WaitingForRequired` and `Active` according to readiness.
    fn reconcile(&mut self, cx: &Component<I>) {
        let ready = self.required_available();
        match self.state {
            ComponentState::WaitingForRequired if ready => {
                let res = guarded(|| self.instance.start());
                self.report(res, "start", None, cx);
                self.transition(ComponentState::Active, cx);
            }
            ComponentState::Active if !ready => {
                self.deactivate(cx);
                self.transition(ComponentState::WaitingForRequired, cx);
            }
            _ => {}
        }
    }

    fn deactivate(&mut self, cx: &Component<I>) {
        let res = guarded(|| self.instance.stop());
        self.report(res, "stop", None, cx);
        let res = guarded(|| self.instance.destroy());
        self.report(res, "destroy", None, cx);
    }

    fn required_available(&self) -> bool {
        self.slots
            .iter()
            .all(|s| !s.dependency.required || !s.bound.is_empty())
    }

    fn transition(&mut self, to: ComponentState, cx: &Component<I>) {
        let from = std::mem::replace(&mut self.state, to);
        cx.shared.state.store(to);
        tracing::debug!(component = %cx.name(), %from, %to, "state transition");
        let bus = cx.bus();
        bus.publish(bus.notice(NoticeKind::StateChanged).with_state(to));
        self.listeners.notify(cx, to);
    }

    fn report(
        &self,
        res: Result<(), CallbackError>,
        hook: &'static str,
        dependency: Option<&DependencyShared<I>>,
        cx: &Component<I>,
    ) {
        let Err(err) = res else {
            return;
        };
        let dependency = dependency.map(|d| d.name.clone());
        tracing::warn!(
            component = %cx.name(),
            hook,
            dependency = dependency.as_deref().unwrap_or("-"),
            error = %err,
            "callback failed; transition completes"
        );
        let mut notice = cx
            .bus()
            .notice(NoticeKind::CallbackFailed)
            .with_reason(format!("{hook}: {err}"));
        if let Some(dependency) = dependency {
            notice = notice.with_dependency(dependency);
        }
        cx.bus().publish(notice);
    }
}

/// Runs a callback, turning a panic into [`CallbackError::Panicked`].
fn guarded(f: impl FnOnce() -> Result<(), CallbackError>) -> Result<(), CallbackError> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|panic| {
        Err(CallbackError::Panicked {
            reason: panic_reason(panic.as_ref()),
        })
    })
}
