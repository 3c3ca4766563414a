use super::Entity;
use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A physical or logical asset (building, vehicle, room, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Asset ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Asset name.
    pub name: String,
    /// Asset type.
    #[serde(rename = "type")]
    pub asset_type: String,
    /// Optional display label.
    pub label: Option<String>,
    /// Optional image reference.
    pub image: Option<String>,
    /// Free-form additional info.
    pub additional_info: Option<Value>,
    /// Customer the asset is assigned to.
    pub customer_id: Option<EntityId>,
}

impl Asset {
    /// Creates an empty asset with the creation time derived from its ID.
    pub fn new(tenant_id: TenantId, id: EntityId) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            name: String::new(),
            asset_type: "default".to_string(),
            label: None,
            image: None,
            additional_info: None,
            customer_id: None,
        }
    }
}

impl Entity for Asset {
    const ENTITY_TYPE: EntityType = EntityType::Asset;

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
