//! Error types used by the depvisor runtime and by user callbacks.
//!
//! This module defines three error enums:
//!
//! - [`ComponentError`]: errors raised while wiring components and dependencies.
//! - [`CallbackError`]: failures of user lifecycle/dependency callbacks.
//! - [`ConfigurationError`]: outcome of a rejected or undeliverable configuration update.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::any::Any;

use thiserror::Error;

/// # Errors produced while wiring components.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// `ComponentBuilder::build` was called without an implementation instance.
    #[error("component has no implementation instance")]
    MissingImplementation,

    /// The dependency is already attached to a component (or twice to the same builder).
    #[error("dependency '{dependency}' is already attached to a component")]
    AlreadyAttached {
        /// Name of the offending dependency.
        dependency: String,
    },

    /// The dependency is not attached, or its component has been dropped.
    #[error("dependency is not attached to a live component")]
    Detached,
}

impl ComponentError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use depvisor::ComponentError;
    ///
    /// assert_eq!(ComponentError::Detached.as_label(), "component_detached");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::MissingImplementation => "component_missing_implementation",
            ComponentError::AlreadyAttached { .. } => "component_already_attached",
            ComponentError::Detached => "component_detached",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ComponentError::MissingImplementation => "no implementation".to_string(),
            ComponentError::AlreadyAttached { dependency } => {
                format!("already attached: {dependency}")
            }
            ComponentError::Detached => "detached".to_string(),
        }
    }
}

/// # Failures of user callbacks.
///
/// User code returns [`CallbackError::Failed`]; panics caught by the runtime are
/// reported as [`CallbackError::Panicked`]. Neither stops the drain loop: the
/// state machine completes the transition it was making and the failure is
/// published as a [`NoticeKind::CallbackFailed`](crate::NoticeKind::CallbackFailed).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The callback reported a failure.
    #[error("callback failed: {reason}")]
    Failed {
        /// The underlying error message.
        reason: String,
    },

    /// The callback panicked; the panic was caught.
    #[error("callback panicked: {reason}")]
    Panicked {
        /// Panic payload rendered as text.
        reason: String,
    },
}

impl CallbackError {
    /// Shorthand for [`CallbackError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        CallbackError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use depvisor::CallbackError;
    ///
    /// let err = CallbackError::failed("boom");
    /// assert_eq!(err.as_label(), "callback_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CallbackError::Failed { .. } => "callback_failed",
            CallbackError::Panicked { .. } => "callback_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            CallbackError::Failed { reason } => format!("error: {reason}"),
            CallbackError::Panicked { reason } => format!("panic: {reason}"),
        }
    }
}

/// # Outcome of a configuration update that did not take effect.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The consumer rejected the proposed configuration; the bound state is unchanged.
    #[error("configuration rejected: {reason}")]
    Rejected {
        /// Why the configuration is invalid.
        reason: String,
    },

    /// `updated` was called from inside a callback of the owning component,
    /// where waiting for the update would wait on itself. Nothing was queued.
    #[error("configuration update issued from inside the owning component's drain loop")]
    Reentrant,

    /// The configuration dependency is not attached to a live component.
    #[error("configuration dependency is not attached to a live component")]
    Detached,

    /// The update was queued but its drain step panicked before replying.
    #[error("configuration update abandoned by the drain loop")]
    Abandoned,
}

impl ConfigurationError {
    /// Shorthand for [`ConfigurationError::Rejected`].
    pub fn rejected(reason: impl Into<String>) -> Self {
        ConfigurationError::Rejected {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use depvisor::ConfigurationError;
    ///
    /// let err = ConfigurationError::rejected("missing key 'port'");
    /// assert_eq!(err.as_label(), "configuration_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigurationError::Rejected { .. } => "configuration_rejected",
            ConfigurationError::Reentrant => "configuration_reentrant",
            ConfigurationError::Detached => "configuration_detached",
            ConfigurationError::Abandoned => "configuration_abandoned",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ConfigurationError::Rejected { reason } => format!("rejected: {reason}"),
            ConfigurationError::Reentrant => "reentrant update".to_string(),
            ConfigurationError::Detached => "detached".to_string(),
            ConfigurationError::Abandoned => "abandoned".to_string(),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
