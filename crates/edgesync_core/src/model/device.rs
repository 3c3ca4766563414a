use super::{Credentials, Entity};
use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A connected device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Device name.
    pub name: String,
    /// Device type (mirrors the profile name).
    #[serde(rename = "type")]
    pub device_type: String,
    /// Optional display label.
    pub label: Option<String>,
    /// Customer the device is assigned to.
    pub customer_id: Option<EntityId>,
    /// Device profile.
    pub device_profile_id: Option<EntityId>,
    /// Assigned firmware package.
    pub firmware_id: Option<EntityId>,
    /// Assigned software package.
    pub software_id: Option<EntityId>,
    /// Free-form additional info.
    pub additional_info: Option<Value>,
}

impl Device {
    /// Creates an empty device with the creation time derived from its ID.
    pub fn new(tenant_id: TenantId, id: EntityId) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            name: String::new(),
            device_type: "default".to_string(),
            label: None,
            customer_id: None,
            device_profile_id: None,
            firmware_id: None,
            software_id: None,
            additional_info: None,
        }
    }
}

impl Entity for Device {
    const ENTITY_TYPE: EntityType = EntityType::Device;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

wire_enum! {
    /// How a device authenticates.
    pub enum DeviceCredentialsType ("credentials_type") {
        /// Access token.
        AccessToken => "ACCESS_TOKEN",
        /// X.509 certificate.
        X509Certificate => "X509_CERTIFICATE",
        /// MQTT basic auth.
        MqttBasic => "MQTT_BASIC",
        /// LwM2M credentials.
        Lwm2mCredentials => "LWM2M_CREDENTIALS",
    }
}

/// Credentials of a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCredentials {
    /// Owning device.
    pub device_id: EntityId,
    /// Credentials type.
    pub credentials_type: DeviceCredentialsType,
    /// Credentials ID (the token for access-token credentials).
    pub credentials_id: String,
    /// Credentials value (certificate, JSON for MQTT basic, ...).
    pub credentials_value: Option<String>,
}

impl Credentials for DeviceCredentials {
    fn owner_id(&self) -> EntityId {
        self.device_id
    }
}
