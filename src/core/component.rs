//! # Component handle.
//!
//! [`Component`] is a cheap `Clone` handle over the shared component state:
//!
//! ```text
//! Component<I> ──► Arc<ComponentShared<I>>
//!                     ├─ queue:   SerialQueue<Command<I>>    (submitted from any thread)
//!                     ├─ machine: Mutex<Machine<I>>          (locked only by the drainer)
//!                     ├─ state:   AtomicState                (snapshot reads)
//!                     └─ bus:     Bus                        (notices)
//! ```
//!
//! Every mutating call enqueues one command and returns; if no other thread is
//! draining the component, the calling thread drains it before returning.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use super::builder::ComponentBuilder;
use super::config::ComponentConfig;
use super::machine::{Command, Machine};
use super::queue::SerialQueue;
use super::state::{AtomicState, ComponentState};
use crate::events::{Bus, Notice};
use crate::lifecycle::Lifecycle;
use crate::listeners::StateListener;

pub(crate) struct ComponentShared<I> {
    pub(crate) name: Arc<str>,
    pub(crate) queue: SerialQueue<Command<I>>,
    machine: Mutex<Machine<I>>,
    pub(crate) state: AtomicState,
    bus: Bus,
}

impl<I> ComponentShared<I> {
    pub(crate) fn new(name: Arc<str>, machine: Machine<I>, bus: Bus) -> Self {
        Self {
            name,
            queue: SerialQueue::new(),
            machine: Mutex::new(machine),
            state: AtomicState::default(),
            bus,
        }
    }
}

/// Handle to a component: an implementation object activated once its
/// required dependencies are available.
pub struct Component<I> {
    pub(crate) shared: Arc<ComponentShared<I>>,
}

impl<I> Clone for Component<I> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<I> Component<I> {
    /// Component name, as configured.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Snapshot of the current state.
    ///
    /// Reflects the last transition applied by the drain loop; a transition
    /// being applied on another thread may not be visible yet.
    pub fn state(&self) -> ComponentState {
        self.shared.state.load()
    }

    /// Subscribes to the component's notices.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.shared.bus.subscribe()
    }

    /// Number of commands waiting to be applied.
    pub fn pending(&self) -> usize {
        self.shared.queue.pending()
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.shared.bus
    }
}

impl<I: Lifecycle> Component<I> {
    /// Creates a builder for a component with the given configuration.
    pub fn builder(cfg: ComponentConfig) -> ComponentBuilder<I> {
        ComponentBuilder::new(cfg)
    }

    /// Requests activation. No-op unless the component is `Inactive`.
    pub fn start(&self) {
        self.submit(Command::Start);
    }

    /// Requests deactivation. No-op if the component is already `Inactive`.
    pub fn stop(&self) {
        self.submit(Command::Stop);
    }

    /// Registers a listener; it sees every transition applied after this call.
    pub fn add_state_listener(&self, listener: Arc<dyn StateListener<I>>) {
        self.submit(Command::AddListener(listener));
    }

    /// Unregisters a listener previously added (matched by pointer identity).
    pub fn remove_state_listener(&self, listener: &Arc<dyn StateListener<I>>) {
        self.submit(Command::RemoveListener(Arc::clone(listener)));
    }

    pub(crate) fn submit(&self, command: Command<I>) -> bool {
        let shared = &self.shared;
        shared
            .queue
            .submit(command, |command| shared.machine.lock().apply(command, self))
    }
}

impl<I> fmt::Debug for Component<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("pending", &self.pending())
            .finish()
    }
}
