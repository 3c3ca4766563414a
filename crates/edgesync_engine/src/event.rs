//! Sync events: durable records of outbound synchronization intents.

use edgesync_core::{now_millis, wire_enum, EntityId, EntityType, StoreError, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    /// Kind of entity a sync event refers to.
    pub enum SyncEventType ("sync_event_type") {
        /// Asset.
        Asset => "ASSET",
        /// Alarm.
        Alarm => "ALARM",
        /// Dashboard.
        Dashboard => "DASHBOARD",
        /// Device.
        Device => "DEVICE",
        /// Device profile.
        DeviceProfile => "DEVICE_PROFILE",
        /// User.
        User => "USER",
        /// Relation (the event entity ID is the relation's source).
        Relation => "RELATION",
        /// Customer.
        Customer => "CUSTOMER",
        /// Entity view.
        EntityView => "ENTITY_VIEW",
        /// Edge.
        Edge => "EDGE",
    }
}

impl SyncEventType {
    /// Returns the entity type, or `None` for relations.
    pub fn entity_type(self) -> Option<EntityType> {
        match self {
            Self::Asset => Some(EntityType::Asset),
            Self::Alarm => Some(EntityType::Alarm),
            Self::Dashboard => Some(EntityType::Dashboard),
            Self::Device => Some(EntityType::Device),
            Self::DeviceProfile => Some(EntityType::DeviceProfile),
            Self::User => Some(EntityType::User),
            Self::Customer => Some(EntityType::Customer),
            Self::EntityView => Some(EntityType::EntityView),
            Self::Edge => Some(EntityType::Edge),
            Self::Relation => None,
        }
    }

    /// Returns the event type used for entities of `entity_type`.
    pub fn from_entity_type(entity_type: EntityType) -> Option<Self> {
        match entity_type {
            EntityType::Asset => Some(Self::Asset),
            EntityType::Alarm => Some(Self::Alarm),
            EntityType::Dashboard => Some(Self::Dashboard),
            EntityType::Device => Some(Self::Device),
            EntityType::DeviceProfile => Some(Self::DeviceProfile),
            EntityType::User => Some(Self::User),
            EntityType::Customer => Some(Self::Customer),
            EntityType::EntityView => Some(Self::EntityView),
            EntityType::Edge => Some(Self::Edge),
            EntityType::Tenant => None,
        }
    }
}

wire_enum! {
    /// Action recorded by a sync event.
    pub enum SyncEventAction ("sync_event_action") {
        /// Entity added.
        Added => "ADDED",
        /// Entity updated.
        Updated => "UPDATED",
        /// Entity deleted.
        Deleted => "DELETED",
        /// Alarm acknowledged.
        AlarmAck => "ALARM_ACK",
        /// Alarm cleared.
        AlarmClear => "ALARM_CLEAR",
        /// Credentials changed.
        CredentialsUpdated => "CREDENTIALS_UPDATED",
        /// Ask the peer for credentials.
        CredentialsRequest => "CREDENTIALS_REQUEST",
        /// Ask the peer for attributes.
        AttributesRequest => "ATTRIBUTES_REQUEST",
        /// Ask the peer for relations.
        RelationRequest => "RELATION_REQUEST",
        /// Ask the peer for devices of a profile.
        DeviceProfileDevicesRequest => "DEVICE_PROFILE_DEVICES_REQUEST",
    }
}

/// A durable outbound synchronization intent.
///
/// `action` is kept as a string so events written by newer versions can
/// still be paged and cleaned up; unknown actions are rejected only when a
/// message is constructed from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    /// Event ID (time-based).
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Entity the event is about.
    pub entity_id: EntityId,
    /// Kind of that entity.
    pub entity_type: SyncEventType,
    /// Action, never empty once stored.
    pub action: String,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Entity snapshot taken when the event was recorded.
    pub entity_body: Option<Value>,
}

impl SyncEvent {
    /// Creates an event stamped with the current time.
    pub fn new(
        tenant_id: TenantId,
        entity_type: SyncEventType,
        action: SyncEventAction,
        entity_id: EntityId,
        entity_body: Option<Value>,
    ) -> Self {
        Self {
            id: EntityId::new_time_based(),
            tenant_id,
            entity_id,
            entity_type,
            action: action.as_str().to_string(),
            created_time: now_millis(),
            entity_body,
        }
    }

    /// Overrides the creation time.
    pub fn with_created_time(mut self, created_time: i64) -> Self {
        self.created_time = created_time;
        self
    }

    /// Parses the action.
    pub fn parsed_action(&self) -> Result<SyncEventAction, StoreError> {
        self.action.parse()
    }
}
