//! # State listeners.
//!
//! This module provides the [`StateListener`] trait and its built-in
//! implementations, notified on every transition of a component.
//!
//! ## Architecture
//! ```text
//! drain loop ── transition ──► ListenerRegistry::notify(state)
//!                                   │
//!                                   ├──► closure / StateListener::changed   (synchronous)
//!                                   ├──► LogWriter                          (feature "logging")
//!                                   └──► Offload ──► [queue] ──► AsyncStateListener::on_change
//! ```
//!
//! ## Listener types
//! - **Synchronous listeners**: run inside the drain loop; keep them short.
//! - **Offloaded listeners**: an [`AsyncStateListener`] behind an [`Offload`],
//!   for anything that awaits or takes time.

mod listener;
#[cfg(feature = "logging")]
mod log;
mod offload;
mod registry;

pub use listener::StateListener;
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use offload::{AsyncStateListener, Offload, StateChange};

pub(crate) use registry::ListenerRegistry;
