//! End-to-end tests: a cloud and an edge exchanging real batches.

use edgesync_core::{
    Alarm, AlarmSeverity, AlarmStatus, CredentialsStore, DeviceCredentials, DeviceCredentialsType,
    EntityRef, EntityRelation, EntityType, RelationStore, UserCredentials,
};
use edgesync_engine::{ApplyOutcome, SkipReason, SyncConfig, SyncError, SyncEventAction};
use edgesync_protocol::{AssetUpdateMsg, SyncMessage, UpdateMsgType};
use edgesync_testkit::prelude::*;
use proptest::prelude::*;

fn quiet() -> SyncConfig {
    SyncConfig::default().with_request_additional_data(false)
}

fn outcomes(rounds: &[PumpStats]) -> Vec<ApplyOutcome> {
    rounds.iter().flat_map(|r| r.outcomes.iter().cloned()).collect()
}

#[tokio::test]
async fn repeated_create_converges_on_one_record() {
    let harness = EdgeCloudHarness::with_config(quiet());
    let asset = entities::asset(harness.tenant, "Boiler");
    harness.cloud.memory.assets.insert(asset.clone());
    for _ in 0..2 {
        harness
            .cloud
            .engine
            .record_entity_change(SyncEventAction::Added, &asset)
            .await
            .unwrap();
    }

    let stats = harness.pump(Direction::CloudToEdge).await;
    assert_eq!(stats.delivered, 2);
    assert_eq!(
        stats.outcomes,
        vec![ApplyOutcome::Created, ApplyOutcome::Updated]
    );
    assert_eq!(harness.edge.memory.assets.len(), 1);
}

#[tokio::test]
async fn image_only_update_keeps_name_and_type() {
    let node = TestNode::quiet();
    let tenant = edgesync_core::TenantId::new();
    let mut asset = entities::asset(tenant, "Boiler");
    asset.asset_type = "room".into();
    node.memory.assets.insert(asset.clone());

    let (id_msb, id_lsb) = asset.id.halves();
    let outcome = node
        .engine
        .apply_inbound(
            tenant,
            SyncMessage::Asset(AssetUpdateMsg {
                msg_type: UpdateMsgType::EntityUpdated,
                id_msb,
                id_lsb,
                image: Some("tb-image;/api/images/boiler.png".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

    assert_eq!(outcome, ApplyOutcome::Updated);
    let stored = node.memory.assets.get(tenant, asset.id).unwrap();
    assert_eq!(stored.name, "Boiler");
    assert_eq!(stored.asset_type, "room");
    assert_eq!(stored.image.as_deref(), Some("tb-image;/api/images/boiler.png"));
}

#[tokio::test]
async fn deleting_what_the_edge_never_had_is_a_no_op() {
    let harness = EdgeCloudHarness::with_config(quiet());
    let asset = entities::asset(harness.tenant, "Ghost");
    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::Deleted, &asset)
        .await
        .unwrap();

    let stats = harness.pump(Direction::CloudToEdge).await;
    assert_eq!(stats.outcomes, vec![ApplyOutcome::NoOp]);
    assert!(harness.cloud.events.is_empty());
}

#[tokio::test]
async fn alarm_is_created_then_acknowledged_on_the_edge() {
    let harness = EdgeCloudHarness::with_config(quiet());
    let tenant = harness.tenant;

    // Each side has its own device named "Pump-1".
    let cloud_device = entities::device(tenant, "Pump-1", None);
    harness.cloud.memory.devices.insert(cloud_device.clone());
    harness
        .edge
        .memory
        .devices
        .insert(entities::device(tenant, "Pump-1", None));

    let mut alarm = Alarm::new(
        tenant,
        EntityRef::new(EntityType::Device, cloud_device.id),
        "High Temperature",
        AlarmSeverity::Critical,
    );
    harness.cloud.memory.alarms.insert(alarm.clone());
    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::Added, &alarm)
        .await
        .unwrap();
    let stats = harness.pump(Direction::CloudToEdge).await;
    assert_eq!(stats.outcomes, vec![ApplyOutcome::Created]);

    alarm.status = AlarmStatus::ActiveAck;
    alarm.ack_ts = 5_000;
    harness.cloud.memory.alarms.insert(alarm.clone());
    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::AlarmAck, &alarm)
        .await
        .unwrap();
    let stats = harness.pump(Direction::CloudToEdge).await;
    assert_eq!(stats.outcomes, vec![ApplyOutcome::Updated]);

    assert_eq!(harness.edge.memory.alarms.len(), 1);
}

#[tokio::test]
async fn alarm_for_unknown_originator_is_skipped() {
    let harness = EdgeCloudHarness::with_config(quiet());
    let tenant = harness.tenant;
    let device = entities::device(tenant, "Pump-2", None);
    harness.cloud.memory.devices.insert(device.clone());
    let alarm = Alarm::new(
        tenant,
        EntityRef::new(EntityType::Device, device.id),
        "Offline",
        AlarmSeverity::Major,
    );
    harness.cloud.memory.alarms.insert(alarm.clone());
    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::Added, &alarm)
        .await
        .unwrap();

    let stats = harness.pump(Direction::CloudToEdge).await;
    assert!(stats.failures.is_empty());
    assert!(matches!(
        &stats.outcomes[..],
        [ApplyOutcome::Skipped(SkipReason::OriginatorMissing { originator_name, .. })]
            if originator_name == "Pump-2"
    ));
    assert!(harness.edge.memory.alarms.is_empty());
}

#[tokio::test]
async fn relation_waits_for_both_endpoints() {
    let harness = EdgeCloudHarness::with_config(quiet());
    let tenant = harness.tenant;
    let asset = entities::asset(tenant, "Building A");
    let device = entities::device(tenant, "Meter", None);
    harness.cloud.memory.assets.insert(asset.clone());
    harness.cloud.memory.devices.insert(device.clone());
    harness.edge.memory.assets.insert(asset.clone());

    let relation = EntityRelation::new(
        EntityRef::new(EntityType::Asset, asset.id),
        EntityRef::new(EntityType::Device, device.id),
        "Contains",
    );
    harness
        .cloud
        .memory
        .relations
        .save(tenant, relation.clone())
        .await
        .unwrap();
    harness
        .cloud
        .engine
        .record_relation_change(tenant, SyncEventAction::Added, &relation)
        .await
        .unwrap();
    let stats = harness.pump(Direction::CloudToEdge).await;
    assert_eq!(
        stats.outcomes,
        vec![ApplyOutcome::Skipped(SkipReason::ReferenceMissing(relation.to))]
    );
    assert!(harness.edge.memory.relations.is_empty());

    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::Added, &device)
        .await
        .unwrap();
    harness
        .cloud
        .engine
        .record_relation_change(tenant, SyncEventAction::Added, &relation)
        .await
        .unwrap();
    let stats = harness.pump(Direction::CloudToEdge).await;
    assert_eq!(stats.failures.len(), 0);
    assert_eq!(harness.edge.memory.relations.len(), 1);
}

#[tokio::test]
async fn new_user_on_edge_pulls_its_credentials() {
    let harness = EdgeCloudHarness::with_config(quiet());
    let tenant = harness.tenant;
    let user = entities::user(tenant, "operator@example.com");
    harness.cloud.memory.users.insert(user.clone());
    harness
        .cloud
        .memory
        .user_credentials
        .save(
            tenant,
            UserCredentials {
                user_id: user.id,
                enabled: true,
                password: Some("$2a$10$hash".into()),
                activate_token: None,
                reset_token: None,
            },
        )
        .await
        .unwrap();
    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::Added, &user)
        .await
        .unwrap();

    let rounds = harness.settle().await;
    assert!(rounds.iter().all(|r| r.failures.is_empty()));

    let credentials = harness.edge.memory.user_credentials.get(tenant, user.id).unwrap();
    assert!(credentials.enabled);
    assert_eq!(credentials.password.as_deref(), Some("$2a$10$hash"));
    assert_eq!(credentials.activate_token, None);
    assert!(harness.edge.events.is_empty());
    assert!(harness.cloud.events.is_empty());
}

#[tokio::test]
async fn new_device_profile_pulls_its_devices() {
    let harness = EdgeCloudHarness::with_config(quiet());
    let tenant = harness.tenant;
    let profile = entities::device_profile(tenant, "thermostat");
    harness.cloud.memory.device_profiles.insert(profile.clone());
    let mut devices = Vec::new();
    for name in ["T-1", "T-2"] {
        let device = entities::device(tenant, name, Some(profile.id));
        harness.cloud.memory.devices.insert(device.clone());
        harness
            .cloud
            .memory
            .device_credentials
            .save(
                tenant,
                DeviceCredentials {
                    device_id: device.id,
                    credentials_type: DeviceCredentialsType::AccessToken,
                    credentials_id: format!("token-{name}"),
                    credentials_value: None,
                },
            )
            .await
            .unwrap();
        devices.push(device);
    }
    harness
        .cloud
        .memory
        .devices
        .insert(entities::device(tenant, "unrelated", None));
    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::Added, &profile)
        .await
        .unwrap();

    let rounds = harness.settle().await;
    assert!(rounds.iter().all(|r| r.failures.is_empty()));

    assert_eq!(harness.edge.memory.devices.len(), 2);
    for device in &devices {
        let replica = harness.edge.memory.devices.get(tenant, device.id).unwrap();
        assert_eq!(replica.device_profile_id, Some(profile.id));
        let credentials = harness
            .edge
            .memory
            .device_credentials
            .get(tenant, device.id)
            .unwrap();
        assert_eq!(credentials.credentials_id, format!("token-{}", device.name));
    }
}

#[tokio::test]
async fn attribute_requests_are_refused_without_blocking_sync() {
    let harness = EdgeCloudHarness::new();
    let asset = entities::asset(harness.tenant, "Boiler");
    harness.cloud.memory.assets.insert(asset.clone());
    harness
        .cloud
        .engine
        .record_entity_change(SyncEventAction::Added, &asset)
        .await
        .unwrap();

    let rounds = harness.settle().await;
    let failures: Vec<_> = rounds.iter().flat_map(|r| r.failures.iter()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "attributes_request");
    assert!(matches!(failures[0].1, SyncError::Unsupported { .. }));

    assert!(outcomes(&rounds).contains(&ApplyOutcome::Enqueued(0)));
    assert!(harness.edge.memory.assets.get(harness.tenant, asset.id).is_some());
    assert!(harness.cloud.events.is_empty());
    assert!(harness.edge.events.is_empty());
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn asset_survives_the_trip_to_the_edge(
        asset in tenant_id_strategy().prop_flat_map(asset_strategy)
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let harness = EdgeCloudHarness {
            tenant: asset.tenant_id,
            ..EdgeCloudHarness::with_config(quiet())
        };
        harness.cloud.memory.assets.insert(asset.clone());
        runtime
            .block_on(
                harness
                    .cloud
                    .engine
                    .record_entity_change(SyncEventAction::Added, &asset),
            )
            .unwrap();
        let stats = runtime.block_on(harness.pump(Direction::CloudToEdge));
        prop_assert_eq!(stats.outcomes, vec![ApplyOutcome::Created]);

        let replica = harness.edge.memory.assets.get(asset.tenant_id, asset.id).unwrap();
        prop_assert_eq!(replica.name, asset.name);
        prop_assert_eq!(replica.asset_type, asset.asset_type);
        prop_assert_eq!(replica.label, asset.label);
        prop_assert_eq!(replica.additional_info, asset.additional_info);
    }
}
