//! # Component implementation trait.
//!
//! Provides [`Lifecycle`], the hooks a component's implementation object
//! receives as the component becomes active and inactive.
//!
//! ## Call order
//! ```text
//! WaitingForRequired ──► start() ──► Active ──► stop() ──► destroy() ──► WaitingForRequired | Inactive
//! ```
//!
//! ## Rules
//! - Every hook runs inside the component's drain loop: never concurrently with
//!   another hook or dependency callback of the same component.
//! - `stop()` and `destroy()` only run when leaving `Active`. A component
//!   stopped while still waiting for its required dependencies gets no hooks.
//! - A hook returning `Err` (or panicking) is reported as a
//!   [`NoticeKind::CallbackFailed`](crate::NoticeKind::CallbackFailed) notice;
//!   the transition completes anyway.
//!
//! ## Example
//! ```rust
//! use depvisor::{CallbackError, Lifecycle};
//!
//! struct Client {
//!     connected: bool,
//! }
//!
//! impl Lifecycle for Client {
//!     fn start(&mut self) -> Result<(), CallbackError> {
//!         self.connected = true;
//!         Ok(())
//!     }
//!
//!     fn stop(&mut self) -> Result<(), CallbackError> {
//!         self.connected = false;
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::CallbackError;

/// Lifecycle hooks of a component implementation.
///
/// All hooks default to doing nothing.
pub trait Lifecycle: Send + 'static {
    /// Called once every required dependency is available, right before the
    /// component becomes `Active`.
    fn start(&mut self) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Called when the component leaves `Active`.
    fn stop(&mut self) -> Result<(), CallbackError> {
        Ok(())
    }

    /// Called right after [`stop`](Self::stop); releases whatever `start` acquired.
    fn destroy(&mut self) -> Result<(), CallbackError> {
        Ok(())
    }
}
