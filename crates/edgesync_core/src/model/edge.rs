use super::Entity;
use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};

/// An edge instance registered with the tenant.
///
/// Relations may point at the edge itself, so it is a valid endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Edge ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Edge name.
    pub name: String,
    /// Edge type.
    #[serde(rename = "type")]
    pub edge_type: String,
    /// Routing key the edge connects with.
    pub routing_key: String,
}

impl Edge {
    /// Creates an edge of type "default".
    pub fn new(
        tenant_id: TenantId,
        id: EntityId,
        name: impl Into<String>,
        routing_key: impl Into<String>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            name: name.into(),
            edge_type: "default".to_string(),
            routing_key: routing_key.into(),
        }
    }
}

impl Entity for Edge {
    const ENTITY_TYPE: EntityType = EntityType::Edge;

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
