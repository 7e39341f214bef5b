//! # depvisor
//!
//! **Depvisor** is a dependency-driven component activation runtime.
//!
//! A component wraps an application object and activates it only once every
//! required collaborator (service bindings and a configuration snapshot) is
//! available, tearing it down in a well-defined order the moment one of them
//! disappears. Bindings arrive from any number of threads concurrently; each
//! component applies them one at a time through a serialized queue, so every
//! transition and callback happens exactly once.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  registry thread A      registry thread B      config admin        app thread
//!        │                      │                     │                   │
//!   dep_a.add(ev)         dep_b.remove(ev)     cfg.updated(Some)    component.start()
//!        ▼                      ▼                     ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  Component (Arc<ComponentShared>)                                         │
//! │  - SerialQueue<Command>  (any thread submits; exactly one drains)         │
//! │  - Machine               (instance, bound sets per slot, state, listeners)│
//! │  - AtomicState           (snapshot reads)                                 │
//! │  - Bus                   (Notice broadcast)                               │
//! └─────────────┬─────────────────────────────┬───────────────────────────────┘
//!               ▼                             ▼
//!   Lifecycle::start/stop/destroy      StateListener::changed
//!   on_add / on_remove / on_change       ├─ closures, LogWriter
//!   on_updated                           └─ Offload ──► AsyncStateListener (tokio)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Inactive ──start()──► WaitingForRequired ──all required available──► Lifecycle::start ──► Active
//!                              ▲                                                            │
//!                              └────── WaitingForRequired ◄── destroy ◄── stop ◄── required lost
//!
//! stop(): Active ─► stop ─► destroy ─► Inactive;  WaitingForRequired ─► Inactive (no callbacks)
//! ```
//!
//! ## Features
//! | Area               | Description                                                    | Key types / traits                                   |
//! |--------------------|----------------------------------------------------------------|------------------------------------------------------|
//! | **Components**     | Build, start and stop components; snapshot their state.        | [`Component`], [`ComponentBuilder`], [`Lifecycle`]   |
//! | **Dependencies**   | Feed service bindings and configuration from any thread.       | [`Dependency`], [`ConfigurationDependency`]          |
//! | **Listeners**      | Observe transitions synchronously or through an async worker.  | [`StateListener`], [`AsyncStateListener`], [`Offload`] |
//! | **Notices**        | Broadcast health and transition reports.                        | [`Notice`], [`NoticeKind`], [`Bus`]                  |
//! | **Errors**         | Typed errors for building, callbacks and configuration.        | [`ComponentError`], [`CallbackError`], [`ConfigurationError`] |
//! | **Configuration**  | Per-component settings.                                        | [`ComponentConfig`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use depvisor::{
//!     CallbackError, Component, ComponentConfig, ComponentState, Configuration,
//!     ConfigurationDependency, ConfigurationError, Dependency, Event, Lifecycle,
//! };
//!
//! #[derive(Default)]
//! struct Client {
//!     endpoint: Option<String>,
//!     backends: Vec<u64>,
//! }
//!
//! impl Lifecycle for Client {
//!     fn start(&mut self) -> Result<(), CallbackError> {
//!         println!("connecting to {:?} via {:?}", self.backends, self.endpoint);
//!         Ok(())
//!     }
//! }
//!
//! let backend = Dependency::builder("backend")
//!     .required(true)
//!     .on_add(|c: &mut Client, ev| {
//!         c.backends.push(ev.id().get());
//!         Ok(())
//!     })
//!     .on_remove(|c: &mut Client, ev| {
//!         c.backends.retain(|id| *id != ev.id().get());
//!         Ok(())
//!     })
//!     .build();
//!
//! let settings = ConfigurationDependency::builder("settings")
//!     .on_updated(|c: &mut Client, cfg: Option<&Configuration>| {
//!         let Some(cfg) = cfg else {
//!             c.endpoint = None;
//!             return Ok(());
//!         };
//!         let endpoint = cfg
//!             .get("endpoint")
//!             .ok_or_else(|| ConfigurationError::rejected("missing 'endpoint'"))?;
//!         c.endpoint = Some(endpoint.to_string());
//!         Ok(())
//!     })
//!     .build();
//!
//! let client = Component::builder(ComponentConfig::named("client"))
//!     .implementation(Client::default())
//!     .attach(&backend)
//!     .attach(&settings)
//!     .listener(Arc::new(|c: &Component<Client>, s: ComponentState| {
//!         println!("{} -> {s}", c.name());
//!     }))
//!     .build()?;
//!
//! client.start();
//! backend.add(Event::new(1))?;
//! assert_eq!(client.state(), ComponentState::WaitingForRequired);
//!
//! assert!(settings.updated(Some(Configuration::new())).is_err());
//! settings.updated(Some(Configuration::new().with("endpoint", "tcp://db:5432")))?;
//! assert_eq!(client.state(), ComponentState::Active);
//!
//! client.stop();
//! assert_eq!(client.state(), ComponentState::Inactive);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod core;
mod dependencies;
mod error;
mod events;
mod lifecycle;
mod listeners;

// ---- Public re-exports ----

pub use crate::core::{Component, ComponentBuilder, ComponentConfig, ComponentState};
pub use dependencies::{
    Attach, ConfigurationDependency, ConfigurationDependencyBuilder, Dependency, DependencyBuilder,
};
pub use error::{CallbackError, ComponentError, ConfigurationError};
pub use events::{Bus, Configuration, Event, EventId, Notice, NoticeKind, Payload};
pub use lifecycle::Lifecycle;
pub use listeners::{AsyncStateListener, Offload, StateChange, StateListener};

// Optional: expose a simple built-in logger listener (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use listeners::LogWriter;
