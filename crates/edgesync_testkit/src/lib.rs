//! # EdgeSync Testkit
//!
//! Test utilities for EdgeSync.
//!
//! This crate provides:
//! - In-memory sync nodes and entity fixtures
//! - Property-based test generators using proptest
//! - An edge↔cloud harness pumping batches over the wire encoding
//! - Fuzz testing harnesses
//! - Concurrent delivery stress tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edgesync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn asset_reaches_edge() {
//!     let harness = EdgeCloudHarness::new();
//!     let asset = entities::asset(harness.tenant, "Boiler");
//!     harness.cloud.memory.assets.insert(asset.clone());
//!     harness
//!         .cloud
//!         .engine
//!         .record_entity_change(SyncEventAction::Added, &asset)
//!         .await
//!         .unwrap();
//!     harness.settle().await;
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod integration;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::stress::*;
    pub use edgesync_engine::{SyncEventAction, SyncEventType};
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use integration::*;
pub use stress::*;
