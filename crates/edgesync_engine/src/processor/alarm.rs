//! Alarm processor: applies alarm create/ack/clear/delete by originator and type.

use super::{
    decode_snapshot, parse_enum, parse_json, unsupported, EntityProcessor, ProcessorContext,
    StoreResultExt,
};
use crate::constructors::alarm_update_msg;
use crate::error::SyncResult;
use crate::event::SyncEvent;
use crate::outcome::{ApplyOutcome, SkipReason};
use async_trait::async_trait;
use edgesync_core::{
    now_millis, Alarm, AlarmSeverity, AlarmStatus, EntityRef, EntityType, TenantId,
};
use edgesync_protocol::{AlarmUpdateMsg, SyncMessage, UpdateMsgType};
use tracing::{debug, warn};

/// Synchronizes alarms.
///
/// Alarm IDs are local to each side. Inbound messages are matched to the
/// latest alarm of the same type raised by the same originator, and the
/// originator itself travels by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmProcessor;

/// Natural-key lookup result.
enum Resolved {
    Found {
        originator: EntityRef,
        alarm: Option<Alarm>,
    },
    OriginatorMissing(SkipReason),
}

impl AlarmProcessor {
    async fn resolve(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: &AlarmUpdateMsg,
    ) -> SyncResult<Resolved> {
        let originator_type: EntityType = parse_enum(&msg.originator_type, msg)?;
        let originator = ctx
            .collaborators
            .find_originator(tenant_id, originator_type, &msg.originator_name)
            .await
            .context(msg)?;
        let Some(originator) = originator else {
            warn!(
                tenant = %tenant_id,
                originator_type = %originator_type,
                originator_name = %msg.originator_name,
                "alarm originator not found, message skipped"
            );
            return Ok(Resolved::OriginatorMissing(SkipReason::OriginatorMissing {
                originator_type: msg.originator_type.clone(),
                originator_name: msg.originator_name.clone(),
            }));
        };
        let alarm = ctx
            .collaborators
            .alarms
            .find_latest_by_originator_and_type(tenant_id, originator, &msg.alarm_type)
            .await
            .context(msg)?;
        Ok(Resolved::Found { originator, alarm })
    }
}

#[async_trait]
impl EntityProcessor for AlarmProcessor {
    type Msg = AlarmUpdateMsg;
    const KIND: EntityType = EntityType::Alarm;

    async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: AlarmUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let store = &ctx.collaborators.alarms;
        match msg.msg_type {
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated => {
                let severity: AlarmSeverity = parse_enum(&msg.severity, &msg)?;
                let status: AlarmStatus = parse_enum(&msg.status, &msg)?;
                let details = parse_json(msg.details.as_deref(), &msg)?;

                let (alarm, created) = {
                    let _guard = ctx.locks.acquire(Self::KIND, tenant_id).await;
                    let (originator, existing) = match self.resolve(ctx, tenant_id, &msg).await? {
                        Resolved::Found { originator, alarm } => (originator, alarm),
                        Resolved::OriginatorMissing(reason) => {
                            return Ok(ApplyOutcome::Skipped(reason))
                        }
                    };
                    let (mut alarm, created) = match existing {
                        Some(alarm) if !alarm.status.is_cleared() => (alarm, false),
                        _ => {
                            let mut alarm =
                                Alarm::new(tenant_id, originator, msg.alarm_type.clone(), severity);
                            alarm.start_ts = msg.start_ts;
                            alarm.clear_ts = msg.clear_ts;
                            alarm.propagate = msg.propagate;
                            (alarm, true)
                        }
                    };
                    alarm.status = status;
                    alarm.ack_ts = msg.ack_ts;
                    alarm.end_ts = msg.end_ts;
                    alarm.details = details;
                    (store.save(alarm).await.context(&msg)?, created)
                };
                debug!(tenant = %tenant_id, alarm = %alarm.id, created, "alarm applied");
                Ok(ApplyOutcome::upserted(created))
            }
            UpdateMsgType::AlarmAck | UpdateMsgType::AlarmClear | UpdateMsgType::EntityDeleted => {
                let existing = match self.resolve(ctx, tenant_id, &msg).await? {
                    Resolved::Found { alarm, .. } => alarm,
                    Resolved::OriginatorMissing(reason) => {
                        return Ok(ApplyOutcome::Skipped(reason))
                    }
                };
                let Some(mut alarm) = existing else {
                    debug!(tenant = %tenant_id, alarm_type = %msg.alarm_type, "no alarm to update");
                    return Ok(ApplyOutcome::NoOp);
                };
                let now = now_millis();
                if msg.msg_type == UpdateMsgType::EntityDeleted {
                    let existed = store.delete(tenant_id, alarm.id).await.context(&msg)?;
                    return Ok(ApplyOutcome::deleted(existed));
                }
                if msg.msg_type == UpdateMsgType::AlarmAck {
                    alarm.status = alarm.status.acked();
                    alarm.ack_ts = if msg.ack_ts > 0 { msg.ack_ts } else { now };
                } else {
                    alarm.status = alarm.status.cleared();
                    alarm.clear_ts = if msg.clear_ts > 0 { msg.clear_ts } else { now };
                }
                store.save(alarm).await.context(&msg)?;
                Ok(ApplyOutcome::Updated)
            }
            other @ UpdateMsgType::Unrecognized(_) => Err(unsupported(Self::KIND, other)),
        }
    }

    async fn construct_outbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        event: &SyncEvent,
        msg_type: UpdateMsgType,
    ) -> SyncResult<Option<SyncMessage>> {
        let alarm = match msg_type {
            UpdateMsgType::EntityDeleted => match decode_snapshot::<Alarm>(event)? {
                Some(alarm) => alarm,
                None => {
                    // No id-only form: the peer matches alarms by originator and type.
                    warn!(tenant = %tenant_id, alarm = %event.entity_id, "alarm delete without snapshot skipped");
                    return Ok(None);
                }
            },
            _ => {
                let found = ctx
                    .collaborators
                    .alarms
                    .find_by_id(tenant_id, event.entity_id)
                    .await
                    .context(event)?;
                match found {
                    Some(alarm) => alarm,
                    None => return Ok(None),
                }
            }
        };
        let originator_name = ctx
            .collaborators
            .originator_name(tenant_id, alarm.originator)
            .await
            .context(event)?;
        let Some(originator_name) = originator_name else {
            debug!(tenant = %tenant_id, originator = %alarm.originator, "alarm originator gone");
            return Ok(None);
        };
        Ok(Some(SyncMessage::Alarm(alarm_update_msg(
            msg_type,
            &alarm,
            &originator_name,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;
    use crate::error::SyncError;
    use crate::event::{SyncEventAction, SyncEventType};
    use crate::identity::IdentityStrategy;
    use edgesync_core::{Device, EntityId};

    fn harness_with_device() -> (Harness, Device) {
        let h = Harness::new();
        let mut device = Device::new(h.tenant, EntityId::new());
        device.name = "Pump 3".into();
        h.memory.devices.insert(device.clone());
        (h, device)
    }

    fn alarm_msg(msg_type: UpdateMsgType, status: &str) -> AlarmUpdateMsg {
        AlarmUpdateMsg {
            msg_type,
            alarm_type: "High temperature".into(),
            originator_type: "DEVICE".into(),
            originator_name: "Pump 3".into(),
            severity: "MAJOR".into(),
            status: status.into(),
            start_ts: 1_000,
            end_ts: 2_000,
            ..AlarmUpdateMsg::default()
        }
    }

    #[test]
    fn alarms_resolve_by_natural_key() {
        assert_eq!(AlarmProcessor.identity(), IdentityStrategy::ByNaturalKey);
    }

    #[tokio::test]
    async fn active_alarm_is_merged_in_place() {
        let (h, _) = harness_with_device();
        let first = AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, alarm_msg(UpdateMsgType::EntityCreated, "ACTIVE_UNACK"))
            .await
            .unwrap();
        let mut update = alarm_msg(UpdateMsgType::EntityUpdated, "ACTIVE_ACK");
        update.ack_ts = 1_500;
        update.end_ts = 3_000;
        let second = AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, update)
            .await
            .unwrap();

        assert_eq!(first, ApplyOutcome::Created);
        assert_eq!(second, ApplyOutcome::Updated);
        assert_eq!(h.memory.alarms.len(), 1);
    }

    #[tokio::test]
    async fn cleared_alarm_starts_a_new_one() {
        let (h, _) = harness_with_device();
        AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, alarm_msg(UpdateMsgType::EntityCreated, "CLEARED_ACK"))
            .await
            .unwrap();
        let outcome = AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, alarm_msg(UpdateMsgType::EntityCreated, "ACTIVE_UNACK"))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);
        assert_eq!(h.memory.alarms.len(), 2);
    }

    #[tokio::test]
    async fn ack_and_clear_follow_status_transitions() {
        let (h, device) = harness_with_device();
        AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, alarm_msg(UpdateMsgType::EntityCreated, "ACTIVE_UNACK"))
            .await
            .unwrap();

        let mut ack = alarm_msg(UpdateMsgType::AlarmAck, "ACTIVE_UNACK");
        ack.ack_ts = 4_000;
        AlarmProcessor.apply_inbound(&h.ctx, h.tenant, ack).await.unwrap();
        AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, alarm_msg(UpdateMsgType::AlarmClear, "ACTIVE_ACK"))
            .await
            .unwrap();

        let originator = EntityRef::new(EntityType::Device, device.id);
        let alarm = h
            .ctx
            .collaborators
            .alarms
            .find_latest_by_originator_and_type(h.tenant, originator, "High temperature")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alarm.status, AlarmStatus::ClearedAck);
        assert_eq!(alarm.ack_ts, 4_000);
        assert!(alarm.clear_ts > 0);
    }

    #[tokio::test]
    async fn missing_originator_is_soft_skip() {
        let h = Harness::new();
        let outcome = AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, alarm_msg(UpdateMsgType::EntityCreated, "ACTIVE_UNACK"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ApplyOutcome::Skipped(SkipReason::OriginatorMissing { .. })
        ));
        assert!(h.memory.alarms.is_empty());
    }

    #[tokio::test]
    async fn ack_of_absent_alarm_is_noop() {
        let (h, _) = harness_with_device();
        let outcome = AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, alarm_msg(UpdateMsgType::AlarmAck, "ACTIVE_UNACK"))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::NoOp);
    }

    #[tokio::test]
    async fn unknown_severity_is_decode_error() {
        let (h, _) = harness_with_device();
        let mut msg = alarm_msg(UpdateMsgType::EntityCreated, "ACTIVE_UNACK");
        msg.severity = "APOCALYPTIC".into();
        let err = AlarmProcessor
            .apply_inbound(&h.ctx, h.tenant, msg)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
    }

    #[tokio::test]
    async fn outbound_names_the_originator() {
        let (h, device) = harness_with_device();
        let alarm = Alarm::new(
            h.tenant,
            EntityRef::new(EntityType::Device, device.id),
            "Door open",
            AlarmSeverity::Warning,
        );
        h.memory.alarms.insert(alarm.clone());
        let event = SyncEvent::new(
            h.tenant,
            SyncEventType::Alarm,
            SyncEventAction::Added,
            alarm.id,
            None,
        );

        let Some(SyncMessage::Alarm(msg)) = AlarmProcessor
            .construct_outbound(&h.ctx, h.tenant, &event, UpdateMsgType::EntityCreated)
            .await
            .unwrap()
        else {
            panic!("expected alarm message");
        };
        assert_eq!(msg.originator_name, "Pump 3");
        assert_eq!(msg.originator_type, "DEVICE");
        assert_eq!(msg.severity, "WARNING");
    }

    #[tokio::test]
    async fn outbound_delete_without_snapshot_is_skipped() {
        let (h, _) = harness_with_device();
        let event = SyncEvent::new(
            h.tenant,
            SyncEventType::Alarm,
            SyncEventAction::Deleted,
            EntityId::new(),
            None,
        );
        let msg = AlarmProcessor
            .construct_outbound(&h.ctx, h.tenant, &event, UpdateMsgType::EntityDeleted)
            .await
            .unwrap();
        assert!(msg.is_none());
    }
}
