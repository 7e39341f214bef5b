//! # Serialized event queue: one drainer at a time, any number of submitters.
//!
//! [`SerialQueue`] gives a component a total, mutually-exclusive order over every
//! unit that can affect it, regardless of which thread submitted the unit.
//!
//! ## Protocol
//! ```text
//! submit(unit):
//!   lock ─► push_back(unit)
//!        ├─ drainer present? ─► unlock, return false   (the drainer will apply it)
//!        └─ no drainer       ─► drainer = current thread, unlock
//!                               loop {
//!                                 lock ─► pop_front ─┬─ Some(u) ─► unlock ─► apply(u)
//!                                                    └─ None    ─► drainer = None, unlock, return true
//!                               }
//! ```
//!
//! ## Rules
//! - The lock guards only the pending list; units run with the lock released, so a
//!   unit may itself submit (reentrant submits are queued behind it).
//! - FIFO over all units, hence FIFO per dependency.
//! - Capacity is unbounded: `submit` never rejects.
//! - A panicking unit is contained and logged; the drain continues and the
//!   drainer role is always released.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::error::panic_reason;

struct Pending<T> {
    units: VecDeque<T>,
    drainer: Option<ThreadId>,
}

/// Per-component queue with a single active drainer.
pub(crate) struct SerialQueue<T> {
    pending: Mutex<Pending<T>>,
}

impl<T> SerialQueue<T> {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(Pending {
                units: VecDeque::new(),
                drainer: None,
            }),
        }
    }

    /// Appends `unit` and, if nobody is draining, drains on the calling thread.
    ///
    /// Returns `true` if the calling thread acted as drainer. Every submitter
    /// must pass an equivalent `apply`; the drainer uses its own for all units.
    pub(crate) fn submit(&self, unit: T, mut apply: impl FnMut(T)) -> bool {
        {
            let mut pending = self.pending.lock();
            pending.units.push_back(unit);
            if pending.drainer.is_some() {
                return false;
            }
            pending.drainer = Some(thread::current().id());
        }
        self.drain(&mut apply);
        true
    }

    fn drain(&self, apply: &mut impl FnMut(T)) {
        loop {
            let next = {
                let mut pending = self.pending.lock();
                match pending.units.pop_front() {
                    Some(unit) => unit,
                    None => {
                        pending.drainer = None;
                        return;
                    }
                }
            };
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| apply(next))) {
                tracing::error!(
                    reason = %panic_reason(panic.as_ref()),
                    "unit panicked inside drain loop; continuing"
                );
            }
        }
    }

    /// True if the calling thread is currently draining this queue.
    pub(crate) fn is_drained_by_current_thread(&self) -> bool {
        self.pending.lock().drainer == Some(thread::current().id())
    }

    /// Number of units waiting to be applied.
    pub(crate) fn pending(&self) -> usize {
        self.pending.lock().units.len()
    }
}
