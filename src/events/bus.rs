//! # Per-component notice channel.
//!
//! Every component owns one [`Bus`]. The bus knows the name of the component
//! it belongs to, so the drain loop only says *what* happened
//! ([`Bus::notice`] stamps the component) and the bus fans it out to
//! whoever called [`Component::subscribe`](crate::Component::subscribe).
//!
//! ```text
//! drain loop ──notice(kind).with_*()──► Bus("gateway") ──┬──► monitoring task
//!                                                        ├──► test harness
//!                                                        └──► ...
//! ```
//!
//! Publishing never blocks and needs no async runtime. Receivers that fall
//! behind get `RecvError::Lagged(n)`; notices sent while nobody listens are gone.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::notice::{Notice, NoticeKind};

/// Broadcast channel for the notices of a single component.
#[derive(Clone, Debug)]
pub struct Bus {
    component: Arc<str>,
    tx: broadcast::Sender<Notice>,
}

impl Bus {
    /// Creates the bus of `component`, keeping at most `capacity` notices
    /// (at least 1) for slow receivers.
    pub fn new(component: impl Into<Arc<str>>, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Notice>(capacity.max(1));
        Self {
            component: component.into(),
            tx,
        }
    }

    /// Name of the component this bus reports for.
    pub fn component(&self) -> &Arc<str> {
        &self.component
    }

    /// Starts a notice of `kind` stamped with this bus' component.
    pub fn notice(&self, kind: NoticeKind) -> Notice {
        Notice::new(kind, Arc::clone(&self.component))
    }

    /// Publishes a notice to every live receiver.
    pub fn publish(&self, notice: Notice) {
        if let Err(broadcast::error::SendError(dropped)) = self.tx.send(notice) {
            tracing::trace!(
                component = %self.component,
                kind = ?dropped.kind,
                seq = dropped.seq,
                "notice dropped; no receivers"
            );
        }
    }

    /// Creates a receiver for notices published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
