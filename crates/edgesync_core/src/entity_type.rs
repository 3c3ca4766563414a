//! Entity type tags and typed references.

use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};
use std::fmt;

wire_enum! {
    /// Kind of entity an identifier refers to.
    ///
    /// The string form (`"DEVICE"`, `"ASSET"`, ...) is what travels on the wire
    /// for relation endpoints, alarm originators and request messages.
    pub enum EntityType ("entity_type") {
        /// Tenant.
        Tenant => "TENANT",
        /// Customer.
        Customer => "CUSTOMER",
        /// User.
        User => "USER",
        /// Dashboard.
        Dashboard => "DASHBOARD",
        /// Asset.
        Asset => "ASSET",
        /// Device.
        Device => "DEVICE",
        /// Device profile.
        DeviceProfile => "DEVICE_PROFILE",
        /// Alarm.
        Alarm => "ALARM",
        /// Entity view.
        EntityView => "ENTITY_VIEW",
        /// Edge gateway.
        Edge => "EDGE",
    }
}

/// An entity identifier tagged with its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    /// Entity type.
    pub entity_type: EntityType,
    /// Entity ID.
    pub id: EntityId,
}

impl EntityRef {
    /// Creates a typed reference.
    pub const fn new(entity_type: EntityType, id: EntityId) -> Self {
        Self { entity_type, id }
    }

    /// Returns the reference of a tenant entity.
    pub const fn tenant(tenant_id: TenantId) -> Self {
        Self::new(EntityType::Tenant, tenant_id.as_entity_id())
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.entity_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_type_as_str_and_from_str() {
        for ty in [
            EntityType::Tenant,
            EntityType::Customer,
            EntityType::User,
            EntityType::Dashboard,
            EntityType::Asset,
            EntityType::Device,
            EntityType::DeviceProfile,
            EntityType::Alarm,
            EntityType::EntityView,
            EntityType::Edge,
        ] {
            assert_eq!(ty.as_str().parse::<EntityType>().unwrap(), ty);
        }
        assert!("RULE_CHAIN".parse::<EntityType>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&EntityType::DeviceProfile).unwrap();
        assert_eq!(json, "\"DEVICE_PROFILE\"");
    }

    #[test]
    fn tenant_ref_shares_the_tenant_uuid() {
        let tenant = TenantId::new();
        let r = EntityRef::tenant(tenant);
        assert_eq!(r.entity_type, EntityType::Tenant);
        assert_eq!(r.id.to_uuid(), tenant.to_uuid());
    }
}
