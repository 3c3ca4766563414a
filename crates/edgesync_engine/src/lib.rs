//! # EdgeSync Engine
//!
//! Entity synchronization between an edge node and its cloud.
//!
//! This crate provides:
//! - Per-kind entity processors (inbound apply, outbound construction)
//! - Pure message constructors
//! - A creation lock registry serializing find-or-create sections
//! - The durable sync event log with keyset paging and TTL cleanup
//! - The edge pairing registry
//! - [`SyncEngine`], the façade transports talk to
//!
//! ## Flow
//!
//! Inbound: transport → [`SyncEngine::apply_batch`] → processor → local
//! stores, plus follow-up [`SyncEvent`]s.
//!
//! Outbound: local change → [`SyncEventLog`] → [`SyncEngine::drain`] →
//! processor builds a fresh message → transport → [`SyncEngine::acknowledge`].
//!
//! ## Key Invariants
//!
//! - Repeating a CREATE converges on one local record
//! - Relations are only stored when both endpoints exist locally
//! - Deleting an absent record is a no-op
//! - A failing message never aborts the rest of its batch
//! - Follow-up events are queued only after the primary mutation succeeded

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collaborators;
mod config;
pub mod constructors;
mod engine;
mod error;
mod event;
mod event_log;
mod identity;
mod locks;
mod outcome;
mod pairing;
mod processor;

pub use collaborators::{Collaborators, InMemoryCollaborators};
pub use config::{LockScope, SyncConfig};
pub use engine::{BatchReport, DrainReport, SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult};
pub use event::{SyncEvent, SyncEventAction, SyncEventType};
pub use event_log::{
    EventCursor, MemorySyncEventDao, PageData, SyncEventDao, SyncEventFilter, SyncEventLog,
    TimePageLink,
};
pub use identity::IdentityStrategy;
pub use locks::{CreationGuard, CreationLocks};
pub use outcome::{ApplyOutcome, SkipReason};
pub use pairing::{EdgePairingRegistry, PairingIdentity, EDGE_SETTINGS_KEY};
pub use processor::{
    AlarmProcessor, AssetProcessor, DashboardProcessor, DeviceProcessor, DeviceProfileProcessor,
    EntityProcessor, ProcessorContext, RelationProcessor, UserProcessor,
};
