//! # Offloaded state listeners.
//!
//! Provides [`Offload`]: a [`StateListener`] that moves transitions off the
//! drain loop into a dedicated tokio task running an [`AsyncStateListener`].
//!
//! ## Architecture
//! ```text
//! drain loop ──changed()──► try_send ──► [bounded queue] ──► worker task ──► listener.on_change()
//!                              │                                   └──────► panic caught, logged
//!                              └─ full/closed ──► ListenerOverflow notice on the component bus
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `changed()` never waits; the drain loop is never held up.
//! - **Overflow**: the change is dropped for this listener only and
//!   `NoticeKind::ListenerOverflow` is published.
//! - **Per-listener FIFO**: changes arrive in transition order.
//! - **Executor injection**: the worker runs on the `tokio::runtime::Handle`
//!   given to [`Offload::spawn`]; the component core never needs a runtime.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if the listener uses `Arc<Mutex<T>>` and panics while holding the lock.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use depvisor::{AsyncStateListener, Offload, StateChange};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl AsyncStateListener for Audit {
//!     async fn on_change(&self, change: &StateChange) {
//!         // write to a slow sink
//!         let _ = change;
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let offload = Offload::spawn(Arc::new(Audit), &tokio::runtime::Handle::current());
//! // component.add_state_listener(offload.clone());
//! offload.shutdown().await;
//! # }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::listener::StateListener;
use crate::core::{Component, ComponentState};
use crate::error::panic_reason;
use crate::events::Notice;

/// A transition as seen by an offloaded listener.
#[derive(Clone, Debug)]
pub struct StateChange {
    /// Name of the component that transitioned.
    pub component: Arc<str>,
    /// State it entered.
    pub state: ComponentState,
    /// Wall-clock time the transition was handed over.
    pub at: SystemTime,
}

/// Asynchronous observer of component transitions.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this listener's queue.
#[async_trait]
pub trait AsyncStateListener: Send + Sync + 'static {
    /// Processes a single transition, in FIFO order.
    async fn on_change(&self, change: &StateChange);

    /// Returns the listener name used in logs and overflow notices.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this listener's queue (min 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}

/// Bridge from the synchronous drain loop to an [`AsyncStateListener`].
pub struct Offload {
    name: &'static str,
    sender: Mutex<Option<mpsc::Sender<Arc<StateChange>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Offload {
    /// Spawns the worker on `runtime` and returns the listener to register.
    #[must_use]
    pub fn spawn(listener: Arc<dyn AsyncStateListener>, runtime: &Handle) -> Arc<Self> {
        let name = listener.name();
        let (tx, mut rx) = mpsc::channel::<Arc<StateChange>>(listener.queue_capacity().max(1));

        let worker = runtime.spawn(async move {
            while let Some(change) = rx.recv().await {
                let fut = listener.on_change(change.as_ref());
                if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                    tracing::error!(
                        listener = name,
                        component = %change.component,
                        reason = %panic_reason(panic.as_ref()),
                        "offloaded listener panicked"
                    );
                }
            }
        });

        Arc::new(Self {
            name,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Closes the queue and waits until the worker has processed what was queued.
    ///
    /// Later transitions are reported as overflow with reason `closed`.
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

impl<I> StateListener<I> for Offload {
    fn changed(&self, component: &Component<I>, state: ComponentState) {
        let change = Arc::new(StateChange {
            component: Arc::from(component.name()),
            state,
            at: SystemTime::now(),
        });
        let reason = match self.sender.lock().as_ref() {
            Some(tx) => match tx.try_send(change) {
                Ok(()) => return,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            },
            None => "closed",
        };
        tracing::warn!(
            listener = self.name,
            component = %component.name(),
            %state,
            reason,
            "offloaded listener dropped a transition"
        );
        component
            .bus()
            .publish(Notice::listener_overflow(component.name(), self.name, reason));
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::ComponentConfig;
    use crate::events::NoticeKind;
    use crate::lifecycle::Lifecycle;

    struct Noop;
    impl Lifecycle for Noop {}

    struct Gate {
        open: tokio::sync::Semaphore,
        seen: Mutex<Vec<ComponentState>>,
    }

    #[async_trait]
    impl AsyncStateListener for Gate {
        async fn on_change(&self, change: &StateChange) {
            let _permit = self.open.acquire().await;
            self.seen.lock().push(change.state);
        }
        fn name(&self) -> &'static str {
            "gate"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overflow_is_reported_and_queue_drains_on_shutdown() {
        let gate = Arc::new(Gate {
            open: tokio::sync::Semaphore::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let offload = Offload::spawn(gate.clone(), &Handle::current());
        let component = Component::builder(ComponentConfig::named("svc"))
            .implementation(Noop)
            .listener(offload.clone())
            .build()
            .unwrap();
        let mut notices = component.subscribe();

        // Inactive -> Waiting -> Active -> Inactive: three transitions against a
        // closed gate with a one-slot queue; at least one must overflow.
        component.start();
        component.stop();

        let overflow = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let n = notices.recv().await.unwrap();
                if n.kind == NoticeKind::ListenerOverflow {
                    return n;
                }
            }
        })
        .await
        .unwrap();
        assert!(overflow.reason.unwrap().contains("listener=gate"));

        gate.open.add_permits(16);
        offload.shutdown().await;
        let seen = gate.seen.lock().clone();
        assert!(!seen.is_empty());
        assert_eq!(seen[0], ComponentState::WaitingForRequired);
    }
}
