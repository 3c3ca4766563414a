//! Outbound message constructors.
//!
//! Pure functions from an entity snapshot to a wire message. They perform
//! no lookups: anything not on the snapshot (customer override, conflict
//! name, originator name) is passed in by the caller. Optional fields are
//! only set when the source value is present.

use edgesync_core::{
    Alarm, Asset, Dashboard, Device, DeviceCredentials, DeviceProfile, EntityId, EntityRef,
    EntityRelation, User, UserCredentials,
};
use edgesync_protocol::{
    AlarmUpdateMsg, AssetUpdateMsg, AttributesRequestMsg, DashboardUpdateMsg,
    DeviceCredentialsRequestMsg, DeviceCredentialsUpdateMsg, DeviceProfileDevicesRequestMsg,
    DeviceProfileUpdateMsg, DeviceUpdateMsg, RelationRequestMsg, RelationUpdateMsg,
    UpdateMsgType, UserCredentialsRequestMsg, UserCredentialsUpdateMsg, UserUpdateMsg,
};
use serde_json::Value;

fn halves(id: Option<EntityId>) -> (Option<u64>, Option<u64>) {
    match id.map(|id| id.halves()) {
        Some((msb, lsb)) => (Some(msb), Some(lsb)),
        None => (None, None),
    }
}

fn json_text(value: Option<&Value>) -> Option<String> {
    value.map(Value::to_string)
}

/// Builds an asset message. `customer_id` overrides the asset's own customer.
pub fn asset_update_msg(
    msg_type: UpdateMsgType,
    asset: &Asset,
    customer_id: Option<EntityId>,
) -> AssetUpdateMsg {
    let (id_msb, id_lsb) = asset.id.halves();
    let (customer_id_msb, customer_id_lsb) = halves(customer_id.or(asset.customer_id));
    AssetUpdateMsg {
        msg_type,
        id_msb,
        id_lsb,
        customer_id_msb,
        customer_id_lsb,
        name: Some(asset.name.clone()),
        asset_type: Some(asset.asset_type.clone()),
        label: asset.label.clone(),
        image: asset.image.clone(),
        additional_info: json_text(asset.additional_info.as_ref()),
    }
}

/// Builds an ID-only asset delete message.
pub fn asset_delete_msg(id: EntityId) -> AssetUpdateMsg {
    let (id_msb, id_lsb) = id.halves();
    AssetUpdateMsg {
        msg_type: UpdateMsgType::EntityDeleted,
        id_msb,
        id_lsb,
        ..AssetUpdateMsg::default()
    }
}

/// Builds an alarm message. The originator travels by name.
pub fn alarm_update_msg(
    msg_type: UpdateMsgType,
    alarm: &Alarm,
    originator_name: &str,
) -> AlarmUpdateMsg {
    let (id_msb, id_lsb) = alarm.id.halves();
    AlarmUpdateMsg {
        msg_type,
        id_msb,
        id_lsb,
        alarm_type: alarm.alarm_type.clone(),
        originator_type: alarm.originator.entity_type.as_str().to_string(),
        originator_name: originator_name.to_string(),
        severity: alarm.severity.as_str().to_string(),
        status: alarm.status.as_str().to_string(),
        start_ts: alarm.start_ts,
        end_ts: alarm.end_ts,
        ack_ts: alarm.ack_ts,
        clear_ts: alarm.clear_ts,
        details: json_text(alarm.details.as_ref()),
        propagate: alarm.propagate,
    }
}

/// Builds a dashboard message.
///
/// `customer_id` names the customer the message assigns the dashboard to;
/// without it the first assigned customer is sent.
pub fn dashboard_update_msg(
    msg_type: UpdateMsgType,
    dashboard: &Dashboard,
    customer_id: Option<EntityId>,
) -> DashboardUpdateMsg {
    let (id_msb, id_lsb) = dashboard.id.halves();
    let customer = customer_id.or_else(|| dashboard.assigned_customers.iter().next().copied());
    let (customer_id_msb, customer_id_lsb) = halves(customer);
    DashboardUpdateMsg {
        msg_type,
        id_msb,
        id_lsb,
        customer_id_msb,
        customer_id_lsb,
        title: Some(dashboard.title.clone()),
        configuration: json_text(dashboard.configuration.as_ref()),
    }
}

/// Builds an ID-only dashboard delete message.
pub fn dashboard_delete_msg(id: EntityId) -> DashboardUpdateMsg {
    let (id_msb, id_lsb) = id.halves();
    DashboardUpdateMsg {
        msg_type: UpdateMsgType::EntityDeleted,
        id_msb,
        id_lsb,
        ..DashboardUpdateMsg::default()
    }
}

/// Builds a device message.
///
/// `customer_id` overrides the device's own customer. `conflict_name` is
/// the name the device had before the sender renamed it.
pub fn device_update_msg(
    msg_type: UpdateMsgType,
    device: &Device,
    customer_id: Option<EntityId>,
    conflict_name: Option<&str>,
) -> DeviceUpdateMsg {
    let (id_msb, id_lsb) = device.id.halves();
    let (customer_id_msb, customer_id_lsb) = halves(customer_id.or(device.customer_id));
    let (device_profile_id_msb, device_profile_id_lsb) = halves(device.device_profile_id);
    let (firmware_id_msb, firmware_id_lsb) = halves(device.firmware_id);
    let (software_id_msb, software_id_lsb) = halves(device.software_id);
    DeviceUpdateMsg {
        msg_type,
        id_msb,
        id_lsb,
        customer_id_msb,
        customer_id_lsb,
        device_profile_id_msb,
        device_profile_id_lsb,
        firmware_id_msb,
        firmware_id_lsb,
        software_id_msb,
        software_id_lsb,
        name: Some(device.name.clone()),
        device_type: Some(device.device_type.clone()),
        label: device.label.clone(),
        additional_info: json_text(device.additional_info.as_ref()),
        conflict_name: conflict_name.map(str::to_string),
    }
}

/// Builds an ID-only device delete message.
pub fn device_delete_msg(id: EntityId) -> DeviceUpdateMsg {
    let (id_msb, id_lsb) = id.halves();
    DeviceUpdateMsg {
        msg_type: UpdateMsgType::EntityDeleted,
        id_msb,
        id_lsb,
        ..DeviceUpdateMsg::default()
    }
}

/// Builds a device credentials message.
pub fn device_credentials_update_msg(
    credentials: &DeviceCredentials,
) -> DeviceCredentialsUpdateMsg {
    let (device_id_msb, device_id_lsb) = credentials.device_id.halves();
    DeviceCredentialsUpdateMsg {
        device_id_msb,
        device_id_lsb,
        credentials_type: Some(credentials.credentials_type.as_str().to_string()),
        credentials_id: Some(credentials.credentials_id.clone()),
        credentials_value: credentials.credentials_value.clone(),
    }
}

/// Builds a device profile message.
pub fn device_profile_update_msg(
    msg_type: UpdateMsgType,
    profile: &DeviceProfile,
) -> DeviceProfileUpdateMsg {
    let (id_msb, id_lsb) = profile.id.halves();
    let (default_rule_chain_id_msb, default_rule_chain_id_lsb) =
        halves(profile.default_rule_chain_id);
    let (firmware_id_msb, firmware_id_lsb) = halves(profile.firmware_id);
    let (software_id_msb, software_id_lsb) = halves(profile.software_id);
    DeviceProfileUpdateMsg {
        msg_type,
        id_msb,
        id_lsb,
        name: Some(profile.name.clone()),
        description: profile.description.clone(),
        default: profile.is_default,
        profile_type: Some(profile.profile_type.as_str().to_string()),
        transport_type: Some(profile.transport_type.as_str().to_string()),
        provision_type: Some(profile.provision_type.as_str().to_string()),
        provision_device_key: profile.provision_device_key.clone(),
        image: profile.image.clone(),
        profile_data: json_text(profile.profile_data.as_ref()),
        default_rule_chain_id_msb,
        default_rule_chain_id_lsb,
        default_queue_name: profile.default_queue_name.clone(),
        firmware_id_msb,
        firmware_id_lsb,
        software_id_msb,
        software_id_lsb,
    }
}

/// Builds an ID-only device profile delete message.
pub fn device_profile_delete_msg(id: EntityId) -> DeviceProfileUpdateMsg {
    let (id_msb, id_lsb) = id.halves();
    DeviceProfileUpdateMsg {
        msg_type: UpdateMsgType::EntityDeleted,
        id_msb,
        id_lsb,
        ..DeviceProfileUpdateMsg::default()
    }
}

/// Builds a user message. `customer_id` overrides the user's own customer.
pub fn user_update_msg(
    msg_type: UpdateMsgType,
    user: &User,
    customer_id: Option<EntityId>,
) -> UserUpdateMsg {
    let (id_msb, id_lsb) = user.id.halves();
    let (customer_id_msb, customer_id_lsb) = halves(customer_id.or(user.customer_id));
    UserUpdateMsg {
        msg_type,
        id_msb,
        id_lsb,
        customer_id_msb,
        customer_id_lsb,
        email: Some(user.email.clone()),
        authority: Some(user.authority.as_str().to_string()),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        additional_info: json_text(user.additional_info.as_ref()),
    }
}

/// Builds an ID-only user delete message.
pub fn user_delete_msg(id: EntityId) -> UserUpdateMsg {
    let (id_msb, id_lsb) = id.halves();
    UserUpdateMsg {
        msg_type: UpdateMsgType::EntityDeleted,
        id_msb,
        id_lsb,
        ..UserUpdateMsg::default()
    }
}

/// Builds a user credentials message.
pub fn user_credentials_update_msg(credentials: &UserCredentials) -> UserCredentialsUpdateMsg {
    let (user_id_msb, user_id_lsb) = credentials.user_id.halves();
    UserCredentialsUpdateMsg {
        user_id_msb,
        user_id_lsb,
        enabled: credentials.enabled,
        password: credentials.password.clone(),
    }
}

/// Builds a relation message.
pub fn relation_update_msg(msg_type: UpdateMsgType, relation: &EntityRelation) -> RelationUpdateMsg {
    let (from_id_msb, from_id_lsb) = relation.from.id.halves();
    let (to_id_msb, to_id_lsb) = relation.to.id.halves();
    RelationUpdateMsg {
        msg_type,
        from_id_msb,
        from_id_lsb,
        from_entity_type: relation.from.entity_type.as_str().to_string(),
        to_id_msb,
        to_id_lsb,
        to_entity_type: relation.to.entity_type.as_str().to_string(),
        relation_type: relation.relation_type.clone(),
        type_group: Some(relation.type_group.as_str().to_string()),
        additional_info: json_text(relation.additional_info.as_ref()),
    }
}

/// Asks the peer for every relation of `entity`.
pub fn relation_request_msg(entity: EntityRef, ts: i64) -> RelationRequestMsg {
    let (entity_id_msb, entity_id_lsb) = entity.id.halves();
    RelationRequestMsg {
        entity_id_msb,
        entity_id_lsb,
        entity_type: entity.entity_type.as_str().to_string(),
        ts,
    }
}

/// Asks the peer for the attributes of `entity`, as issued at `ts`.
pub fn attributes_request_msg(entity: EntityRef, ts: i64) -> AttributesRequestMsg {
    let (entity_id_msb, entity_id_lsb) = entity.id.halves();
    AttributesRequestMsg {
        entity_id_msb,
        entity_id_lsb,
        entity_type: entity.entity_type.as_str().to_string(),
        ts,
    }
}

/// Asks the peer for a user's credentials.
pub fn user_credentials_request_msg(user_id: EntityId) -> UserCredentialsRequestMsg {
    let (user_id_msb, user_id_lsb) = user_id.halves();
    UserCredentialsRequestMsg {
        user_id_msb,
        user_id_lsb,
    }
}

/// Asks the peer for a device's credentials.
pub fn device_credentials_request_msg(device_id: EntityId) -> DeviceCredentialsRequestMsg {
    let (device_id_msb, device_id_lsb) = device_id.halves();
    DeviceCredentialsRequestMsg {
        device_id_msb,
        device_id_lsb,
    }
}

/// Asks the peer for every device of a profile.
pub fn device_profile_devices_request_msg(profile_id: EntityId) -> DeviceProfileDevicesRequestMsg {
    let (device_profile_id_msb, device_profile_id_lsb) = profile_id.halves();
    DeviceProfileDevicesRequestMsg {
        device_profile_id_msb,
        device_profile_id_lsb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgesync_core::{AlarmSeverity, EntityType, TenantId};
    use serde_json::json;

    #[test]
    fn asset_fields_are_set_only_when_present() {
        let mut asset = Asset::new(TenantId::new(), EntityId::new());
        asset.name = "Boiler".into();
        let msg = asset_update_msg(UpdateMsgType::EntityCreated, &asset, None);

        assert_eq!(msg.name.as_deref(), Some("Boiler"));
        assert!(msg.label.is_none());
        assert!(msg.additional_info.is_none());
        assert!(msg.customer_id_msb.is_none() && msg.customer_id_lsb.is_none());
        assert_eq!(EntityId::from_halves(msg.id_msb, msg.id_lsb), asset.id);
    }

    #[test]
    fn customer_override_wins() {
        let mut asset = Asset::new(TenantId::new(), EntityId::new());
        asset.customer_id = Some(EntityId::new());
        let override_id = EntityId::new();

        let msg = asset_update_msg(UpdateMsgType::EntityUpdated, &asset, Some(override_id));
        let sent = EntityId::from_halves(msg.customer_id_msb.unwrap(), msg.customer_id_lsb.unwrap());
        assert_eq!(sent, override_id);
    }

    #[test]
    fn device_carries_conflict_name() {
        let device = Device::new(TenantId::new(), EntityId::new());
        let msg = device_update_msg(UpdateMsgType::EntityCreated, &device, None, Some("Pump 1"));
        assert_eq!(msg.conflict_name.as_deref(), Some("Pump 1"));
        assert!(msg.device_profile_id_msb.is_none());
    }

    #[test]
    fn alarm_uses_originator_name() {
        let originator = EntityRef::new(EntityType::Device, EntityId::new());
        let mut alarm = Alarm::new(TenantId::new(), originator, "High Temp", AlarmSeverity::Major);
        alarm.details = Some(json!({"value": 91}));

        let msg = alarm_update_msg(UpdateMsgType::AlarmAck, &alarm, "Thermo 7");
        assert_eq!(msg.originator_type, "DEVICE");
        assert_eq!(msg.originator_name, "Thermo 7");
        assert_eq!(msg.severity, "MAJOR");
        assert_eq!(msg.details.as_deref(), Some(r#"{"value":91}"#));
    }

    #[test]
    fn delete_messages_are_id_only() {
        let id = EntityId::new();
        let msg = device_profile_delete_msg(id);
        assert_eq!(msg.msg_type, UpdateMsgType::EntityDeleted);
        assert_eq!(EntityId::from_halves(msg.id_msb, msg.id_lsb), id);
        assert!(msg.name.is_none());
    }

    #[test]
    fn relation_sends_type_group() {
        let relation = EntityRelation::new(
            EntityRef::new(EntityType::Asset, EntityId::new()),
            EntityRef::new(EntityType::Device, EntityId::new()),
            "Contains",
        );
        let msg = relation_update_msg(UpdateMsgType::EntityCreated, &relation);
        assert_eq!(msg.type_group.as_deref(), Some("COMMON"));
        assert_eq!(msg.from_entity_type, "ASSET");
        assert_eq!(msg.to_entity_type, "DEVICE");
    }
}
