//! Requests for data the sender is missing.

use serde::{Deserialize, Serialize};

/// Asks the peer to send every relation touching an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationRequestMsg {
    /// Entity ID, high half.
    pub entity_id_msb: u64,
    /// Entity ID, low half.
    pub entity_id_lsb: u64,
    /// Entity type, e.g. `"ASSET"`.
    pub entity_type: String,
    /// When the request was issued (unix millis). Data the peer already
    /// sent before this time need not be sent again.
    pub ts: i64,
}

/// Asks the peer to send the attributes of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttributesRequestMsg {
    /// Entity ID, high half.
    pub entity_id_msb: u64,
    /// Entity ID, low half.
    pub entity_id_lsb: u64,
    /// Entity type, e.g. `"DEVICE"`.
    pub entity_type: String,
    /// When the request was issued (unix millis). Data the peer already
    /// sent before this time need not be sent again.
    pub ts: i64,
}

/// Asks the peer to send a user's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserCredentialsRequestMsg {
    /// User ID, high half.
    pub user_id_msb: u64,
    /// User ID, low half.
    pub user_id_lsb: u64,
}

/// Asks the peer to send a device's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceCredentialsRequestMsg {
    /// Device ID, high half.
    pub device_id_msb: u64,
    /// Device ID, low half.
    pub device_id_lsb: u64,
}

/// Asks the peer to send every device using a profile.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceProfileDevicesRequestMsg {
    /// Profile ID, high half.
    pub device_profile_id_msb: u64,
    /// Profile ID, low half.
    pub device_profile_id_lsb: u64,
}
