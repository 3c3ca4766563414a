//! Message batches exchanged between peers.

use crate::error::{ProtocolError, ProtocolResult};
use crate::messages::{
    AlarmUpdateMsg, AssetUpdateMsg, DashboardUpdateMsg, DeviceCredentialsUpdateMsg,
    DeviceProfileUpdateMsg, DeviceUpdateMsg, RelationUpdateMsg, UserCredentialsUpdateMsg,
    UserUpdateMsg,
};
use crate::requests::{
    AttributesRequestMsg, DeviceCredentialsRequestMsg, DeviceProfileDevicesRequestMsg,
    RelationRequestMsg, UserCredentialsRequestMsg,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single message of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Asset update.
    Asset(AssetUpdateMsg),
    /// Alarm update.
    Alarm(AlarmUpdateMsg),
    /// Dashboard update.
    Dashboard(DashboardUpdateMsg),
    /// Device update.
    Device(DeviceUpdateMsg),
    /// Device credentials update.
    DeviceCredentials(DeviceCredentialsUpdateMsg),
    /// Device profile update.
    DeviceProfile(DeviceProfileUpdateMsg),
    /// User update.
    User(UserUpdateMsg),
    /// User credentials update.
    UserCredentials(UserCredentialsUpdateMsg),
    /// Relation update.
    Relation(RelationUpdateMsg),
    /// Relation request.
    RelationRequest(RelationRequestMsg),
    /// Attributes request.
    AttributesRequest(AttributesRequestMsg),
    /// User credentials request.
    UserCredentialsRequest(UserCredentialsRequestMsg),
    /// Device credentials request.
    DeviceCredentialsRequest(DeviceCredentialsRequestMsg),
    /// Device profile devices request.
    DeviceProfileDevicesRequest(DeviceProfileDevicesRequestMsg),
}

impl SyncMessage {
    /// Returns the message kind code.
    pub fn kind_code(&self) -> u8 {
        match self {
            SyncMessage::Asset(_) => 1,
            SyncMessage::Alarm(_) => 2,
            SyncMessage::Dashboard(_) => 3,
            SyncMessage::Device(_) => 4,
            SyncMessage::DeviceCredentials(_) => 5,
            SyncMessage::DeviceProfile(_) => 6,
            SyncMessage::User(_) => 7,
            SyncMessage::UserCredentials(_) => 8,
            SyncMessage::Relation(_) => 9,
            SyncMessage::RelationRequest(_) => 10,
            SyncMessage::AttributesRequest(_) => 11,
            SyncMessage::UserCredentialsRequest(_) => 12,
            SyncMessage::DeviceCredentialsRequest(_) => 13,
            SyncMessage::DeviceProfileDevicesRequest(_) => 14,
        }
    }

    /// Returns a short name of the message kind for logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SyncMessage::Asset(_) => "asset",
            SyncMessage::Alarm(_) => "alarm",
            SyncMessage::Dashboard(_) => "dashboard",
            SyncMessage::Device(_) => "device",
            SyncMessage::DeviceCredentials(_) => "device_credentials",
            SyncMessage::DeviceProfile(_) => "device_profile",
            SyncMessage::User(_) => "user",
            SyncMessage::UserCredentials(_) => "user_credentials",
            SyncMessage::Relation(_) => "relation",
            SyncMessage::RelationRequest(_) => "relation_request",
            SyncMessage::AttributesRequest(_) => "attributes_request",
            SyncMessage::UserCredentialsRequest(_) => "user_credentials_request",
            SyncMessage::DeviceCredentialsRequest(_) => "device_credentials_request",
            SyncMessage::DeviceProfileDevicesRequest(_) => "device_profile_devices_request",
        }
    }
}

/// An ordered group of messages sent together.
///
/// Messages are grouped in one list per kind. The batch ID is a random
/// positive number that is only unique locally; peers use it to correlate
/// acknowledgements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageBatch {
    /// Batch ID (positive).
    pub batch_id: i32,
    /// Asset updates.
    pub asset_update_msgs: Vec<AssetUpdateMsg>,
    /// Alarm updates.
    pub alarm_update_msgs: Vec<AlarmUpdateMsg>,
    /// Dashboard updates.
    pub dashboard_update_msgs: Vec<DashboardUpdateMsg>,
    /// Device updates.
    pub device_update_msgs: Vec<DeviceUpdateMsg>,
    /// Device credentials updates.
    pub device_credentials_update_msgs: Vec<DeviceCredentialsUpdateMsg>,
    /// Device profile updates.
    pub device_profile_update_msgs: Vec<DeviceProfileUpdateMsg>,
    /// User updates.
    pub user_update_msgs: Vec<UserUpdateMsg>,
    /// User credentials updates.
    pub user_credentials_update_msgs: Vec<UserCredentialsUpdateMsg>,
    /// Relation updates.
    pub relation_update_msgs: Vec<RelationUpdateMsg>,
    /// Relation requests.
    pub relation_request_msgs: Vec<RelationRequestMsg>,
    /// Attributes requests.
    pub attributes_request_msgs: Vec<AttributesRequestMsg>,
    /// User credentials requests.
    pub user_credentials_request_msgs: Vec<UserCredentialsRequestMsg>,
    /// Device credentials requests.
    pub device_credentials_request_msgs: Vec<DeviceCredentialsRequestMsg>,
    /// Device profile devices requests.
    pub device_profile_devices_request_msgs: Vec<DeviceProfileDevicesRequestMsg>,
}

impl MessageBatch {
    /// Creates an empty batch with a freshly drawn batch ID.
    pub fn new() -> Self {
        Self::with_batch_id(next_batch_id())
    }

    /// Creates an empty batch with the given ID.
    pub fn with_batch_id(batch_id: i32) -> Self {
        Self {
            batch_id,
            ..Self::default()
        }
    }

    /// Creates a batch holding one message.
    pub fn single(message: SyncMessage) -> Self {
        let mut batch = Self::new();
        batch.push(message);
        batch
    }

    /// Appends a message to the list of its kind.
    pub fn push(&mut self, message: SyncMessage) {
        match message {
            SyncMessage::Asset(msg) => self.asset_update_msgs.push(msg),
            SyncMessage::Alarm(msg) => self.alarm_update_msgs.push(msg),
            SyncMessage::Dashboard(msg) => self.dashboard_update_msgs.push(msg),
            SyncMessage::Device(msg) => self.device_update_msgs.push(msg),
            SyncMessage::DeviceCredentials(msg) => self.device_credentials_update_msgs.push(msg),
            SyncMessage::DeviceProfile(msg) => self.device_profile_update_msgs.push(msg),
            SyncMessage::User(msg) => self.user_update_msgs.push(msg),
            SyncMessage::UserCredentials(msg) => self.user_credentials_update_msgs.push(msg),
            SyncMessage::Relation(msg) => self.relation_update_msgs.push(msg),
            SyncMessage::RelationRequest(msg) => self.relation_request_msgs.push(msg),
            SyncMessage::AttributesRequest(msg) => self.attributes_request_msgs.push(msg),
            SyncMessage::UserCredentialsRequest(msg) => {
                self.user_credentials_request_msgs.push(msg)
            }
            SyncMessage::DeviceCredentialsRequest(msg) => {
                self.device_credentials_request_msgs.push(msg)
            }
            SyncMessage::DeviceProfileDevicesRequest(msg) => {
                self.device_profile_devices_request_msgs.push(msg)
            }
        }
    }

    /// Returns the total number of messages.
    pub fn len(&self) -> usize {
        self.asset_update_msgs.len()
            + self.alarm_update_msgs.len()
            + self.dashboard_update_msgs.len()
            + self.device_update_msgs.len()
            + self.device_credentials_update_msgs.len()
            + self.device_profile_update_msgs.len()
            + self.user_update_msgs.len()
            + self.user_credentials_update_msgs.len()
            + self.relation_update_msgs.len()
            + self.relation_request_msgs.len()
            + self.attributes_request_msgs.len()
            + self.user_credentials_request_msgs.len()
            + self.device_credentials_request_msgs.len()
            + self.device_profile_devices_request_msgs.len()
    }

    /// Returns true if the batch holds no message.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens the batch into messages.
    ///
    /// Profiles come before devices and entities before the relations and
    /// requests that reference them; order within a kind is preserved.
    pub fn into_messages(self) -> Vec<SyncMessage> {
        let mut messages = Vec::with_capacity(self.len());
        messages.extend(self.device_profile_update_msgs.into_iter().map(SyncMessage::DeviceProfile));
        messages.extend(self.device_update_msgs.into_iter().map(SyncMessage::Device));
        messages.extend(
            self.device_credentials_update_msgs
                .into_iter()
                .map(SyncMessage::DeviceCredentials),
        );
        messages.extend(self.asset_update_msgs.into_iter().map(SyncMessage::Asset));
        messages.extend(self.dashboard_update_msgs.into_iter().map(SyncMessage::Dashboard));
        messages.extend(self.user_update_msgs.into_iter().map(SyncMessage::User));
        messages.extend(
            self.user_credentials_update_msgs
                .into_iter()
                .map(SyncMessage::UserCredentials),
        );
        messages.extend(self.alarm_update_msgs.into_iter().map(SyncMessage::Alarm));
        messages.extend(self.relation_update_msgs.into_iter().map(SyncMessage::Relation));
        messages.extend(
            self.relation_request_msgs
                .into_iter()
                .map(SyncMessage::RelationRequest),
        );
        messages.extend(
            self.attributes_request_msgs
                .into_iter()
                .map(SyncMessage::AttributesRequest),
        );
        messages.extend(
            self.user_credentials_request_msgs
                .into_iter()
                .map(SyncMessage::UserCredentialsRequest),
        );
        messages.extend(
            self.device_credentials_request_msgs
                .into_iter()
                .map(SyncMessage::DeviceCredentialsRequest),
        );
        messages.extend(
            self.device_profile_devices_request_msgs
                .into_iter()
                .map(SyncMessage::DeviceProfileDevicesRequest),
        );
        messages
    }

    /// Moves every message of `other` into this batch, keeping this batch's ID.
    pub fn merge(&mut self, other: MessageBatch) {
        for message in other.into_messages() {
            self.push(message);
        }
    }

    /// Encodes to CBOR.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Decodes from CBOR.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Draws a random positive batch ID.
pub fn next_batch_id() -> i32 {
    rand::thread_rng().gen_range(1..=i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg_type::UpdateMsgType;

    fn asset(name: &str) -> AssetUpdateMsg {
        AssetUpdateMsg {
            msg_type: UpdateMsgType::EntityCreated,
            id_msb: 1,
            id_lsb: 2,
            name: Some(name.to_string()),
            asset_type: Some("building".to_string()),
            ..AssetUpdateMsg::default()
        }
    }

    #[test]
    fn batch_ids_are_positive() {
        for _ in 0..1000 {
            assert!(MessageBatch::new().batch_id > 0);
        }
    }

    #[test]
    fn push_groups_by_kind() {
        let mut batch = MessageBatch::with_batch_id(7);
        batch.push(SyncMessage::Asset(asset("A")));
        batch.push(SyncMessage::Asset(asset("B")));
        batch.push(SyncMessage::UserCredentialsRequest(UserCredentialsRequestMsg {
            user_id_msb: 3,
            user_id_lsb: 4,
        }));

        assert_eq!(batch.asset_update_msgs.len(), 2);
        assert_eq!(batch.user_credentials_request_msgs.len(), 1);
        assert_eq!(batch.len(), 3);
        assert!(!batch.is_empty());
    }

    #[test]
    fn into_messages_puts_profiles_before_devices_and_relations_last() {
        let mut batch = MessageBatch::with_batch_id(1);
        batch.push(SyncMessage::Relation(RelationUpdateMsg::default()));
        batch.push(SyncMessage::Device(DeviceUpdateMsg::default()));
        batch.push(SyncMessage::DeviceProfile(DeviceProfileUpdateMsg::default()));

        let codes: Vec<u8> = batch
            .into_messages()
            .iter()
            .map(SyncMessage::kind_code)
            .collect();
        assert_eq!(codes, vec![6, 4, 9]);
    }

    #[test]
    fn cbor_roundtrip_preserves_presence() {
        let mut batch = MessageBatch::with_batch_id(99);
        let mut msg = asset("Boiler room");
        msg.label = Some(String::new());
        batch.push(SyncMessage::Asset(msg.clone()));
        batch.push(SyncMessage::Dashboard(DashboardUpdateMsg {
            msg_type: UpdateMsgType::Unrecognized(17),
            ..DashboardUpdateMsg::default()
        }));

        let decoded = MessageBatch::decode(&batch.encode().unwrap()).unwrap();
        assert_eq!(decoded.batch_id, 99);
        assert_eq!(decoded.asset_update_msgs, vec![msg]);
        assert_eq!(decoded.asset_update_msgs[0].label.as_deref(), Some(""));
        assert!(decoded.asset_update_msgs[0].image.is_none());
        assert_eq!(
            decoded.dashboard_update_msgs[0].msg_type,
            UpdateMsgType::Unrecognized(17)
        );
    }

    #[test]
    fn decode_garbage_fails() {
        let err = MessageBatch::decode(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn merge_keeps_own_id() {
        let mut a = MessageBatch::with_batch_id(1);
        a.push(SyncMessage::Asset(asset("A")));
        let mut b = MessageBatch::with_batch_id(2);
        b.push(SyncMessage::Asset(asset("B")));

        a.merge(b);
        assert_eq!(a.batch_id, 1);
        assert_eq!(a.asset_update_msgs.len(), 2);
    }
}
