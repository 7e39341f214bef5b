//! # Binding tokens delivered to dependencies.
//!
//! An [`Event`] wraps one bound resource: a service instance handed out by a
//! registry, or a [`Configuration`] snapshot handed out by configuration admin.
//! Its identity is the [`EventId`]: an `add` is matched to its later `remove`
//! purely by id, so the remover may construct a fresh `Event` with the same id.
//!
//! ## Example
//! ```rust
//! use depvisor::{Event, EventId};
//!
//! let added = Event::with_service(7, String::from("db-primary"));
//! let removed = Event::new(7);
//!
//! assert_eq!(added, removed);
//! assert_eq!(added.id(), EventId::from(7));
//! assert_eq!(added.service::<String>().map(String::as_str), Some("db-primary"));
//! assert!(removed.service::<String>().is_none());
//! ```

use std::any::Any;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Global sequence counter for binding tokens.
static BINDING_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(u64);

impl EventId {
    /// Raw numeric identity.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for EventId {
    fn from(id: u64) -> Self {
        EventId(id)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The resource carried by an [`Event`].
#[derive(Clone, Default)]
pub enum Payload {
    /// Identity-only token (typical for removals).
    #[default]
    Empty,
    /// A service instance.
    Service(Arc<dyn Any + Send + Sync>),
    /// A configuration snapshot.
    Configuration(Arc<Configuration>),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Empty"),
            Payload::Service(_) => f.write_str("Service(..)"),
            Payload::Configuration(cfg) => f.debug_tuple("Configuration").field(cfg).finish(),
        }
    }
}

/// Immutable, identity-comparable binding token.
///
/// Equality, ordering and hashing use the id only.
#[derive(Clone, Debug)]
pub struct Event {
    id: EventId,
    seq: u64,
    payload: Payload,
}

impl Event {
    /// Creates an identity-only event.
    pub fn new(id: u64) -> Self {
        Self::with_payload(id, Payload::Empty)
    }

    /// Creates an event carrying a service instance.
    pub fn with_service<T: Any + Send + Sync>(id: u64, service: T) -> Self {
        Self::with_payload(id, Payload::Service(Arc::new(service)))
    }

    /// Creates an event carrying a configuration snapshot.
    ///
    /// The id is taken from the binding sequence; a configuration dependency
    /// holds at most one event, so its id only has to be fresh.
    pub fn with_configuration(configuration: Configuration) -> Self {
        let seq = next_seq();
        Self {
            id: EventId(seq),
            seq,
            payload: Payload::Configuration(Arc::new(configuration)),
        }
    }

    /// Creates an event with an explicit payload.
    pub fn with_payload(id: u64, payload: Payload) -> Self {
        Self {
            id: EventId(id),
            seq: next_seq(),
            payload,
        }
    }

    /// Identity of this binding.
    #[inline]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Construction sequence number (diagnostics only, not part of identity).
    #[inline]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The carried resource.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Downcasts the service payload.
    pub fn service<T: Any>(&self) -> Option<&T> {
        match &self.payload {
            Payload::Service(svc) => svc.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Returns the configuration payload, if any.
    pub fn configuration(&self) -> Option<&Arc<Configuration>> {
        match &self.payload {
            Payload::Configuration(cfg) => Some(cfg),
            _ => None,
        }
    }
}

fn next_seq() -> u64 {
    BINDING_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Immutable key/value configuration snapshot.
///
/// ```rust
/// use depvisor::Configuration;
///
/// let cfg = Configuration::new().with("foo", "bar");
/// assert_eq!(cfg.get("foo"), Some("bar"));
/// assert_eq!(cfg.len(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Configuration {
    entries: BTreeMap<String, String>,
}

impl Configuration {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Looks up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Configuration {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
