use super::Entity;
use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    /// Device profile type.
    pub enum DeviceProfileType ("device_profile_type") {
        /// The only profile type.
        Default => "DEFAULT",
    }
}

wire_enum! {
    /// Transport used by devices of a profile.
    pub enum DeviceTransportType ("transport_type") {
        /// Default (HTTP/MQTT/CoAP with JSON payloads).
        Default => "DEFAULT",
        /// MQTT.
        Mqtt => "MQTT",
        /// CoAP.
        Coap => "COAP",
        /// LwM2M.
        Lwm2m => "LWM2M",
        /// SNMP.
        Snmp => "SNMP",
    }
}

wire_enum! {
    /// Device provisioning strategy of a profile.
    pub enum DeviceProfileProvisionType ("provision_type") {
        /// Provisioning disabled.
        Disabled => "DISABLED",
        /// Devices may self-register.
        AllowCreateNewDevices => "ALLOW_CREATE_NEW_DEVICES",
        /// Only pre-provisioned devices may register.
        CheckPreProvisionedDevices => "CHECK_PRE_PROVISIONED_DEVICES",
        /// Provisioned by X.509 certificate chain.
        X509CertificateChain => "X509_CERTIFICATE_CHAIN",
    }
}

impl Default for DeviceProfileType {
    fn default() -> Self {
        Self::Default
    }
}

impl Default for DeviceTransportType {
    fn default() -> Self {
        Self::Default
    }
}

impl Default for DeviceProfileProvisionType {
    fn default() -> Self {
        Self::Disabled
    }
}

/// A device profile shared by a group of devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceProfile {
    /// Profile ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Profile name, unique per tenant.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Whether this is the tenant's default profile.
    pub is_default: bool,
    /// Profile type.
    #[serde(rename = "type")]
    pub profile_type: DeviceProfileType,
    /// Transport type.
    pub transport_type: DeviceTransportType,
    /// Provisioning strategy.
    pub provision_type: DeviceProfileProvisionType,
    /// Provisioning key.
    pub provision_device_key: Option<String>,
    /// Image reference.
    pub image: Option<String>,
    /// Transport/alarm configuration.
    pub profile_data: Option<Value>,
    /// Default rule chain for devices of this profile.
    pub default_rule_chain_id: Option<EntityId>,
    /// Default queue name.
    pub default_queue_name: Option<String>,
    /// Firmware package assigned to the profile.
    pub firmware_id: Option<EntityId>,
    /// Software package assigned to the profile.
    pub software_id: Option<EntityId>,
}

impl DeviceProfile {
    /// Creates an empty profile with the creation time derived from its ID.
    pub fn new(tenant_id: TenantId, id: EntityId) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            name: String::new(),
            description: None,
            is_default: false,
            profile_type: DeviceProfileType::default(),
            transport_type: DeviceTransportType::default(),
            provision_type: DeviceProfileProvisionType::default(),
            provision_device_key: None,
            image: None,
            profile_data: None,
            default_rule_chain_id: None,
            default_queue_name: None,
            firmware_id: None,
            software_id: None,
        }
    }
}

impl Entity for DeviceProfile {
    const ENTITY_TYPE: EntityType = EntityType::DeviceProfile;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let profile = DeviceProfile::new(TenantId::new(), EntityId::new());
        assert_eq!(profile.transport_type, DeviceTransportType::Default);
        assert_eq!(profile.provision_type, DeviceProfileProvisionType::Disabled);
        assert!(!profile.is_default);
    }

    #[test]
    fn provision_type_wire_name() {
        let parsed: DeviceProfileProvisionType = "ALLOW_CREATE_NEW_DEVICES".parse().unwrap();
        assert_eq!(parsed, DeviceProfileProvisionType::AllowCreateNewDevices);
        let json = serde_json::to_string(&DeviceTransportType::Lwm2m).unwrap();
        assert_eq!(json, "\"LWM2M\"");
    }
}
