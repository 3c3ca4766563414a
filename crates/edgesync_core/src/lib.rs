//! # EdgeSync Core
//!
//! Shared building blocks for the EdgeSync edge/cloud replication engine.
//!
//! This crate provides:
//! - `EntityId` / `TenantId` identifiers (time-based IDs carry their creation time)
//! - The synchronized entity model (assets, alarms, devices, users, ...)
//! - Async collaborator traits over local storage and cluster side effects
//! - In-memory collaborators for tests and embedding
//!
//! This crate performs no I/O of its own.

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod attribute;
pub mod entity_type;
pub mod error;
pub mod id;
pub mod memory;
pub mod model;
pub mod notify;
pub mod store;

pub use attribute::{AttributeKv, AttributeScope, KvValue};
pub use entity_type::{EntityRef, EntityType};
pub use error::{StoreError, StoreResult};
pub use id::{now_millis, EntityId, TenantId};
pub use model::*;
pub use notify::{ClusterNotifier, ComponentLifecycleEvent, OtaStateRecalculator};
pub use store::{AlarmStore, AttributeStore, CredentialsStore, EntityStore, RelationStore};
