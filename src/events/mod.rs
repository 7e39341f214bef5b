//! Binding tokens, health notices and the notice bus.
//!
//! This module groups the **binding data model** handed to dependencies and the
//! **observability** types a component emits about itself.
//!
//! ## Contents
//! - [`Event`], [`EventId`], [`Payload`], [`Configuration`] identity-comparable binding tokens
//! - [`Notice`], [`NoticeKind`] health/transition reports
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Producers of events**: service registries (`Dependency::add/remove/change`),
//!   configuration admin (`ConfigurationDependency::updated`).
//! - **Publisher of notices**: each component's drain loop, plus offloaded listeners
//!   on overflow.
//! - **Consumers of notices**: anything holding `Component::subscribe()`.

mod bus;
mod event;
mod notice;

pub use bus::Bus;
pub use event::{Configuration, Event, EventId, Payload};
pub use notice::{Notice, NoticeKind};
