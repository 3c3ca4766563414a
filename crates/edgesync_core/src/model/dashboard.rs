use super::Entity;
use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// A dashboard definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Dashboard ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Title.
    pub title: String,
    /// Widget/layout configuration.
    pub configuration: Option<Value>,
    /// Customers the dashboard is assigned to.
    #[serde(default)]
    pub assigned_customers: BTreeSet<EntityId>,
}

impl Dashboard {
    /// Creates an empty dashboard with the creation time derived from its ID.
    pub fn new(tenant_id: TenantId, id: EntityId) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            title: String::new(),
            configuration: None,
            assigned_customers: BTreeSet::new(),
        }
    }

    /// Assigns the dashboard to a customer. Returns false if already assigned.
    pub fn assign_customer(&mut self, customer_id: EntityId) -> bool {
        self.assigned_customers.insert(customer_id)
    }

    /// Removes every customer assignment.
    pub fn unassign_all_customers(&mut self) {
        self.assigned_customers.clear();
    }
}

impl Entity for Dashboard {
    const ENTITY_TYPE: EntityType = EntityType::Dashboard;

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
