use super::Entity;
use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};

/// A customer of the tenant. Only its existence matters to sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Customer ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Customer title.
    pub title: String,
}

impl Customer {
    /// Creates a customer.
    pub fn new(tenant_id: TenantId, id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            title: title.into(),
        }
    }
}

impl Entity for Customer {
    const ENTITY_TYPE: EntityType = EntityType::Customer;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn name(&self) -> &str {
        &self.title
    }
}

/// A named view over another entity; a valid alarm originator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    /// View ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// View name.
    pub name: String,
    /// View type.
    #[serde(rename = "type")]
    pub view_type: String,
}

impl EntityView {
    /// Creates an entity view.
    pub fn new(tenant_id: TenantId, id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            name: name.into(),
            view_type: "default".to_string(),
        }
    }
}

impl Entity for EntityView {
    const ENTITY_TYPE: EntityType = EntityType::EntityView;

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
