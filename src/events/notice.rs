//! # Health notices emitted by components.
//!
//! The [`NoticeKind`] enum classifies what a component reports about itself:
//! - **State events**: every state-machine transition
//! - **Dependency events**: availability transitions of a dependency slot
//! - **Failure events**: callback failures, rejected configurations, listener trouble
//!
//! The [`Notice`] struct carries additional metadata such as timestamps,
//! component and dependency names, the new state and failure reasons.
//!
//! ## Ordering guarantees
//! Each notice has a globally unique sequence number (`seq`) that increases monotonically.
//! Notices of one component are published from its drain loop, so their `seq`
//! order is the order in which the component applied the underlying units.
//!
//! ## Example
//! ```rust
//! use depvisor::{ComponentState, Notice, NoticeKind};
//!
//! let n = Notice::new(NoticeKind::StateChanged, "client")
//!     .with_state(ComponentState::Active);
//!
//! assert_eq!(n.kind, NoticeKind::StateChanged);
//! assert_eq!(&*n.component, "client");
//! assert_eq!(n.state, Some(ComponentState::Active));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::core::ComponentState;

/// Global sequence counter for notice ordering.
static NOTICE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of component notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    // === State events ===
    /// The component moved to a new state.
    ///
    /// Sets:
    /// - `state`: the new state
    StateChanged,

    // === Dependency events ===
    /// A dependency went from zero to one bound event.
    ///
    /// Sets:
    /// - `dependency`: dependency name
    DependencyAvailable,

    /// A dependency went from one to zero bound events.
    ///
    /// Sets:
    /// - `dependency`: dependency name
    DependencyUnavailable,

    // === Failure events ===
    /// A user callback returned an error or panicked; the transition completed anyway.
    ///
    /// Sets:
    /// - `dependency`: dependency name (absent for lifecycle callbacks)
    /// - `reason`: callback name and error message
    CallbackFailed,

    /// The consumer rejected a configuration update; the bound state is unchanged.
    ///
    /// Sets:
    /// - `dependency`: configuration dependency name
    /// - `reason`: rejection message
    ConfigurationRejected,

    /// A synchronous state listener panicked; the panic was contained.
    ///
    /// Sets:
    /// - `reason`: panic info/message
    ListenerPanicked,

    /// An offloaded listener dropped a state change (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: listener name and "full" or "closed"
    ListenerOverflow,
}

/// Component notice with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`NoticeKind`]
#[derive(Clone, Debug)]
pub struct Notice {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Notice classification.
    pub kind: NoticeKind,
    /// Name of the emitting component.
    pub component: Arc<str>,
    /// New state, for `StateChanged`.
    pub state: Option<ComponentState>,
    /// Name of the dependency involved, if any.
    pub dependency: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Notice {
    /// Creates a new notice of the given kind with current timestamp and next sequence number.
    pub fn new(kind: NoticeKind, component: impl Into<Arc<str>>) -> Self {
        Self {
            seq: NOTICE_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: component.into(),
            state: None,
            dependency: None,
            reason: None,
        }
    }

    /// Attaches the new component state.
    #[inline]
    pub fn with_state(mut self, state: ComponentState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a dependency name.
    #[inline]
    pub fn with_dependency(mut self, dependency: impl Into<Arc<str>>) -> Self {
        self.dependency = Some(dependency.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a listener overflow notice.
    #[inline]
    pub fn listener_overflow(
        component: impl Into<Arc<str>>,
        listener: &'static str,
        reason: &'static str,
    ) -> Self {
        Notice::new(NoticeKind::ListenerOverflow, component)
            .with_reason(format!("listener={listener} reason={reason}"))
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self.kind,
            NoticeKind::CallbackFailed
                | NoticeKind::ConfigurationRejected
                | NoticeKind::ListenerPanicked
                | NoticeKind::ListenerOverflow
        )
    }
}
