//! Entity update messages.
//!
//! IDs travel as two 64-bit halves (`*_msb`, `*_lsb`). Every optional field
//! has explicit presence: `None` means "not transmitted", which receivers
//! treat differently from an empty value. JSON payloads (additional info,
//! configuration, details, profile data) travel as JSON text.

use crate::msg_type::UpdateMsgType;
use serde::{Deserialize, Serialize};

/// Asset created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssetUpdateMsg {
    /// Message type.
    pub msg_type: UpdateMsgType,
    /// Asset ID, high half.
    pub id_msb: u64,
    /// Asset ID, low half.
    pub id_lsb: u64,
    /// Customer ID, high half.
    pub customer_id_msb: Option<u64>,
    /// Customer ID, low half.
    pub customer_id_lsb: Option<u64>,
    /// Name.
    pub name: Option<String>,
    /// Asset type.
    pub asset_type: Option<String>,
    /// Label.
    pub label: Option<String>,
    /// Image reference.
    pub image: Option<String>,
    /// Additional info as JSON text.
    pub additional_info: Option<String>,
}

/// Alarm raised, updated, acknowledged, cleared or deleted.
///
/// Alarms are identified across peers by originator and alarm type, so the
/// originator travels by type and name rather than by ID.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AlarmUpdateMsg {
    /// Message type.
    pub msg_type: UpdateMsgType,
    /// Sender-local alarm ID, high half.
    pub id_msb: u64,
    /// Sender-local alarm ID, low half.
    pub id_lsb: u64,
    /// Alarm type.
    pub alarm_type: String,
    /// Originator entity type, e.g. `"DEVICE"`.
    pub originator_type: String,
    /// Originator name.
    pub originator_name: String,
    /// Severity, e.g. `"MAJOR"`.
    pub severity: String,
    /// Status, e.g. `"ACTIVE_UNACK"`.
    pub status: String,
    /// Start time (unix millis).
    pub start_ts: i64,
    /// End time (unix millis).
    pub end_ts: i64,
    /// Acknowledgement time (unix millis).
    pub ack_ts: i64,
    /// Clear time (unix millis).
    pub clear_ts: i64,
    /// Details as JSON text.
    pub details: Option<String>,
    /// Propagation flag.
    pub propagate: bool,
}

/// Dashboard created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DashboardUpdateMsg {
    /// Message type.
    pub msg_type: UpdateMsgType,
    /// Dashboard ID, high half.
    pub id_msb: u64,
    /// Dashboard ID, low half.
    pub id_lsb: u64,
    /// Customer ID, high half.
    pub customer_id_msb: Option<u64>,
    /// Customer ID, low half.
    pub customer_id_lsb: Option<u64>,
    /// Title.
    pub title: Option<String>,
    /// Configuration as JSON text.
    pub configuration: Option<String>,
}

/// Device created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceUpdateMsg {
    /// Message type.
    pub msg_type: UpdateMsgType,
    /// Device ID, high half.
    pub id_msb: u64,
    /// Device ID, low half.
    pub id_lsb: u64,
    /// Customer ID, high half.
    pub customer_id_msb: Option<u64>,
    /// Customer ID, low half.
    pub customer_id_lsb: Option<u64>,
    /// Device profile ID, high half.
    pub device_profile_id_msb: Option<u64>,
    /// Device profile ID, low half.
    pub device_profile_id_lsb: Option<u64>,
    /// Firmware ID, high half.
    pub firmware_id_msb: Option<u64>,
    /// Firmware ID, low half.
    pub firmware_id_lsb: Option<u64>,
    /// Software ID, high half.
    pub software_id_msb: Option<u64>,
    /// Software ID, low half.
    pub software_id_lsb: Option<u64>,
    /// Name.
    pub name: Option<String>,
    /// Device type.
    pub device_type: Option<String>,
    /// Label.
    pub label: Option<String>,
    /// Additional info as JSON text.
    pub additional_info: Option<String>,
    /// Name the sender renamed the device from after a name clash.
    /// Informational; receivers store `name`.
    pub conflict_name: Option<String>,
}

/// Device credentials changed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceCredentialsUpdateMsg {
    /// Device ID, high half.
    pub device_id_msb: u64,
    /// Device ID, low half.
    pub device_id_lsb: u64,
    /// Credentials type, e.g. `"ACCESS_TOKEN"`.
    pub credentials_type: Option<String>,
    /// Credentials ID.
    pub credentials_id: Option<String>,
    /// Credentials value.
    pub credentials_value: Option<String>,
}

/// Device profile created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceProfileUpdateMsg {
    /// Message type.
    pub msg_type: UpdateMsgType,
    /// Profile ID, high half.
    pub id_msb: u64,
    /// Profile ID, low half.
    pub id_lsb: u64,
    /// Name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Default profile flag.
    pub default: bool,
    /// Profile type, e.g. `"DEFAULT"`.
    pub profile_type: Option<String>,
    /// Transport type, e.g. `"MQTT"`.
    pub transport_type: Option<String>,
    /// Provision type, e.g. `"DISABLED"`.
    pub provision_type: Option<String>,
    /// Provisioning key.
    pub provision_device_key: Option<String>,
    /// Image reference.
    pub image: Option<String>,
    /// Profile data as JSON text.
    pub profile_data: Option<String>,
    /// Default rule chain ID, high half.
    pub default_rule_chain_id_msb: Option<u64>,
    /// Default rule chain ID, low half.
    pub default_rule_chain_id_lsb: Option<u64>,
    /// Default queue name.
    pub default_queue_name: Option<String>,
    /// Firmware ID, high half.
    pub firmware_id_msb: Option<u64>,
    /// Firmware ID, low half.
    pub firmware_id_lsb: Option<u64>,
    /// Software ID, high half.
    pub software_id_msb: Option<u64>,
    /// Software ID, low half.
    pub software_id_lsb: Option<u64>,
}

/// User created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserUpdateMsg {
    /// Message type.
    pub msg_type: UpdateMsgType,
    /// User ID, high half.
    pub id_msb: u64,
    /// User ID, low half.
    pub id_lsb: u64,
    /// Customer ID, high half.
    pub customer_id_msb: Option<u64>,
    /// Customer ID, low half.
    pub customer_id_lsb: Option<u64>,
    /// Email.
    pub email: Option<String>,
    /// Authority, e.g. `"TENANT_ADMIN"`.
    pub authority: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Additional info as JSON text.
    pub additional_info: Option<String>,
}

/// User credentials changed.
///
/// `Debug` output never includes the password.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserCredentialsUpdateMsg {
    /// User ID, high half.
    pub user_id_msb: u64,
    /// User ID, low half.
    pub user_id_lsb: u64,
    /// Whether the user may log in.
    pub enabled: bool,
    /// Password hash.
    pub password: Option<String>,
}

impl std::fmt::Debug for UserCredentialsUpdateMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentialsUpdateMsg")
            .field("user_id_msb", &self.user_id_msb)
            .field("user_id_lsb", &self.user_id_lsb)
            .field("enabled", &self.enabled)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Relation added, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationUpdateMsg {
    /// Message type.
    pub msg_type: UpdateMsgType,
    /// Source ID, high half.
    pub from_id_msb: u64,
    /// Source ID, low half.
    pub from_id_lsb: u64,
    /// Source entity type.
    pub from_entity_type: String,
    /// Target ID, high half.
    pub to_id_msb: u64,
    /// Target ID, low half.
    pub to_id_lsb: u64,
    /// Target entity type.
    pub to_entity_type: String,
    /// Relation type.
    pub relation_type: String,
    /// Relation type group; `COMMON` when absent.
    pub type_group: Option<String>,
    /// Additional info as JSON text.
    pub additional_info: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_nothing_present() {
        let msg = AssetUpdateMsg::default();
        assert_eq!(msg.msg_type, UpdateMsgType::EntityCreated);
        assert!(msg.name.is_none());
        assert!(msg.customer_id_msb.is_none());
    }

    #[test]
    fn unknown_msg_type_survives_json() {
        let json = r#"{"msg_type":9,"id_msb":1,"id_lsb":2,"title":"Ops"}"#;
        let msg: DashboardUpdateMsg = serde_json::from_str(json).unwrap();
        assert_eq!(msg.msg_type, UpdateMsgType::Unrecognized(9));
        assert_eq!(msg.title.as_deref(), Some("Ops"));
        assert!(msg.configuration.is_none());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let msg = UserCredentialsUpdateMsg {
            password: Some("$2a$10$hash".into()),
            ..UserCredentialsUpdateMsg::default()
        };
        let rendered = format!("{msg:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hash"));
    }
}
