//! # EdgeSync Protocol
//!
//! Wire messages exchanged between edge and cloud peers.
//!
//! This crate provides:
//! - `UpdateMsgType` with forward-compatible unknown codes
//! - Update messages for every synchronized entity kind
//! - Request messages for data a peer is missing
//! - `MessageBatch` grouping messages under a random positive batch ID,
//!   with a CBOR encoding for transports and tests
//!
//! This is a pure protocol crate with no I/O operations. Framing and
//! delivery belong to the transport.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod error;
mod messages;
mod msg_type;
mod requests;

pub use batch::{next_batch_id, MessageBatch, SyncMessage};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    AlarmUpdateMsg, AssetUpdateMsg, DashboardUpdateMsg, DeviceCredentialsUpdateMsg,
    DeviceProfileUpdateMsg, DeviceUpdateMsg, RelationUpdateMsg, UserCredentialsUpdateMsg,
    UserUpdateMsg,
};
pub use msg_type::UpdateMsgType;
pub use requests::{
    AttributesRequestMsg, DeviceCredentialsRequestMsg, DeviceProfileDevicesRequestMsg,
    RelationRequestMsg, UserCredentialsRequestMsg,
};
