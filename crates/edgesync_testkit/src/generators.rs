//! Property-based test generators using proptest.
//!
//! Strategies produce values that respect the invariants the engine
//! relies on: non-nil IDs, non-empty names, known wire strings.

use edgesync_core::{
    Asset, EntityId, EntityRef, EntityRelation, EntityType, RelationTypeGroup, TenantId,
};
use edgesync_engine::{SyncEvent, SyncEventAction, SyncEventType};
use edgesync_protocol::{AssetUpdateMsg, RelationUpdateMsg, UpdateMsgType};
use proptest::prelude::*;

/// Strategy for generating non-nil entity IDs.
pub fn entity_id_strategy() -> impl Strategy<Value = EntityId> {
    prop::array::uniform16(any::<u8>())
        .prop_map(EntityId::from_bytes)
        .prop_filter("ID must not be nil", |id| !id.is_nil())
}

/// Strategy for generating tenant IDs.
pub fn tenant_id_strategy() -> impl Strategy<Value = TenantId> {
    prop::array::uniform16(any::<u8>())
        .prop_map(|bytes| TenantId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Strategy for the message types an entity upsert travels as.
pub fn upsert_msg_type_strategy() -> impl Strategy<Value = UpdateMsgType> {
    prop_oneof![
        Just(UpdateMsgType::EntityCreated),
        Just(UpdateMsgType::EntityUpdated),
    ]
}

/// Strategy for entity names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9 _-]{0,23}").expect("Invalid regex")
}

/// Strategy for relation type groups.
pub fn type_group_strategy() -> impl Strategy<Value = RelationTypeGroup> {
    prop_oneof![
        Just(RelationTypeGroup::Common),
        Just(RelationTypeGroup::Alarm),
        Just(RelationTypeGroup::Dashboard),
        Just(RelationTypeGroup::RuleChain),
        Just(RelationTypeGroup::RuleNode),
        Just(RelationTypeGroup::Edge),
    ]
}

/// Strategy for assets owned by `tenant_id`.
pub fn asset_strategy(tenant_id: TenantId) -> impl Strategy<Value = Asset> {
    (
        entity_id_strategy(),
        name_strategy(),
        name_strategy(),
        prop::option::of(name_strategy()),
        prop::option::of(1u32..10_000),
    )
        .prop_map(move |(id, name, asset_type, label, floor)| {
            let mut asset = Asset::new(tenant_id, id);
            asset.name = name;
            asset.asset_type = asset_type;
            asset.label = label;
            asset.additional_info = floor.map(|floor| serde_json::json!({ "floor": floor }));
            asset
        })
}

/// Strategy for inbound asset upserts, some of which omit name and type.
pub fn asset_update_msg_strategy() -> impl Strategy<Value = AssetUpdateMsg> {
    (
        upsert_msg_type_strategy(),
        entity_id_strategy(),
        prop::option::of(name_strategy()),
        prop::option::of(name_strategy()),
        prop::option::of(name_strategy()),
    )
        .prop_map(|(msg_type, id, name, asset_type, label)| {
            let (id_msb, id_lsb) = id.halves();
            AssetUpdateMsg {
                msg_type,
                id_msb,
                id_lsb,
                name,
                asset_type,
                label,
                ..Default::default()
            }
        })
}

/// Strategy for relations between an asset and a device.
pub fn relation_strategy() -> impl Strategy<Value = EntityRelation> {
    (
        entity_id_strategy(),
        entity_id_strategy(),
        prop_oneof![Just("Contains"), Just("Manages"), Just("Uses")],
        type_group_strategy(),
    )
        .prop_map(|(from, to, relation_type, group)| {
            let mut relation = EntityRelation::new(
                EntityRef::new(EntityType::Asset, from),
                EntityRef::new(EntityType::Device, to),
                relation_type,
            );
            relation.type_group = group;
            relation
        })
}

/// Strategy for inbound relation messages carrying `relation`'s endpoints.
pub fn relation_update_msg_strategy() -> impl Strategy<Value = RelationUpdateMsg> {
    (relation_strategy(), any::<bool>()).prop_map(|(relation, delete)| {
        let (from_id_msb, from_id_lsb) = relation.from.id.halves();
        let (to_id_msb, to_id_lsb) = relation.to.id.halves();
        RelationUpdateMsg {
            msg_type: if delete {
                UpdateMsgType::EntityDeleted
            } else {
                UpdateMsgType::EntityCreated
            },
            from_id_msb,
            from_id_lsb,
            from_entity_type: relation.from.entity_type.as_str().to_string(),
            to_id_msb,
            to_id_lsb,
            to_entity_type: relation.to.entity_type.as_str().to_string(),
            relation_type: relation.relation_type,
            type_group: Some(relation.type_group.as_str().to_string()),
            additional_info: None,
        }
    })
}

/// Strategy for event kinds that map to an entity type.
pub fn sync_event_type_strategy() -> impl Strategy<Value = SyncEventType> {
    prop_oneof![
        Just(SyncEventType::Asset),
        Just(SyncEventType::Alarm),
        Just(SyncEventType::Dashboard),
        Just(SyncEventType::Device),
        Just(SyncEventType::DeviceProfile),
        Just(SyncEventType::User),
    ]
}

/// Strategy for event actions.
pub fn sync_event_action_strategy() -> impl Strategy<Value = SyncEventAction> {
    prop_oneof![
        3 => Just(SyncEventAction::Added),
        3 => Just(SyncEventAction::Updated),
        2 => Just(SyncEventAction::Deleted),
        1 => Just(SyncEventAction::AlarmAck),
        1 => Just(SyncEventAction::AlarmClear),
        1 => Just(SyncEventAction::CredentialsRequest),
        1 => Just(SyncEventAction::AttributesRequest),
        1 => Just(SyncEventAction::RelationRequest),
    ]
}

/// Strategy for events of `tenant_id` created inside `[0, 1_000_000)`.
pub fn sync_event_strategy(tenant_id: TenantId) -> impl Strategy<Value = SyncEvent> {
    (
        sync_event_type_strategy(),
        sync_event_action_strategy(),
        entity_id_strategy(),
        0i64..1_000_000,
    )
        .prop_map(move |(entity_type, action, entity_id, created_time)| {
            SyncEvent::new(tenant_id, entity_type, action, entity_id, None)
                .with_created_time(created_time)
        })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn entity_id_is_not_nil(id in entity_id_strategy()) {
            prop_assert!(!id.is_nil());
        }

        #[test]
        fn asset_msgs_carry_their_id(msg in asset_update_msg_strategy()) {
            prop_assert!(msg.msg_type.is_upsert());
            prop_assert!(!EntityId::from_halves(msg.id_msb, msg.id_lsb).is_nil());
        }

        #[test]
        fn relation_msgs_use_known_wire_names(msg in relation_update_msg_strategy()) {
            prop_assert_eq!(msg.from_entity_type.as_str(), "ASSET");
            prop_assert_eq!(msg.to_entity_type.as_str(), "DEVICE");
            let group = msg.type_group.unwrap_or_default();
            prop_assert!(group.parse::<RelationTypeGroup>().is_ok());
        }

        #[test]
        fn events_stay_inside_their_window(event in sync_event_strategy(TenantId::new())) {
            prop_assert!((0..1_000_000).contains(&event.created_time));
            prop_assert!(event.parsed_action().is_ok());
        }
    }
}
