//! Device processor: devices, their credentials, and credential requests.

use super::{
    decode_snapshot, entity_ref, optional_id, parse_enum, parse_json, unsupported,
    EntityProcessor, ProcessorContext, StoreResultExt,
};
use crate::constructors::{device_credentials_update_msg, device_delete_msg, device_update_msg};
use crate::error::SyncResult;
use crate::event::{SyncEvent, SyncEventAction, SyncEventType};
use crate::outcome::{ApplyOutcome, SkipReason};
use async_trait::async_trait;
use edgesync_core::{
    Device, DeviceCredentials, DeviceCredentialsType, EntityId, EntityType, TenantId,
};
use edgesync_protocol::{DeviceCredentialsUpdateMsg, DeviceUpdateMsg, SyncMessage, UpdateMsgType};
use tracing::{debug, warn};

/// Synchronizes devices and their credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceProcessor;

impl DeviceProcessor {
    /// Stores credentials received for an existing device.
    pub async fn apply_credentials(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: DeviceCredentialsUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let device_id = EntityId::from_halves(msg.device_id_msb, msg.device_id_lsb);
        let device_exists = ctx
            .collaborators
            .devices
            .exists(tenant_id, device_id)
            .await
            .context(&msg)?;
        if !device_exists {
            warn!(tenant = %tenant_id, device = %device_id, "credentials for unknown device ignored");
            return Ok(ApplyOutcome::Skipped(SkipReason::ReferenceMissing(
                entity_ref(EntityType::Device, device_id),
            )));
        }

        let credentials_type = match msg.credentials_type.as_deref() {
            Some(raw) => parse_enum(raw, &msg)?,
            None => DeviceCredentialsType::AccessToken,
        };
        let store = &ctx.collaborators.device_credentials;
        let existed = store
            .find_by_owner(tenant_id, device_id)
            .await
            .context(&msg)?
            .is_some();
        let credentials = DeviceCredentials {
            device_id,
            credentials_type,
            credentials_id: msg.credentials_id.clone().unwrap_or_default(),
            credentials_value: msg.credentials_value.clone(),
        };
        store.save(tenant_id, credentials).await.context(&msg)?;
        Ok(ApplyOutcome::upserted(!existed))
    }

    /// Builds the credentials message for a `CREDENTIALS_UPDATED` event.
    pub async fn construct_credentials(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        event: &SyncEvent,
    ) -> SyncResult<Option<SyncMessage>> {
        let credentials = ctx
            .collaborators
            .device_credentials
            .find_by_owner(tenant_id, event.entity_id)
            .await
            .context(event)?;
        Ok(credentials
            .as_ref()
            .map(device_credentials_update_msg)
            .map(SyncMessage::DeviceCredentials))
    }
}

#[async_trait]
impl EntityProcessor for DeviceProcessor {
    type Msg = DeviceUpdateMsg;
    const KIND: EntityType = EntityType::Device;

    async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: DeviceUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let id = EntityId::from_halves(msg.id_msb, msg.id_lsb);
        let store = &ctx.collaborators.devices;
        match msg.msg_type {
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated => {
                let created = {
                    let _guard = ctx.locks.acquire(Self::KIND, tenant_id).await;
                    let existing = store.find_by_id(tenant_id, id).await.context(&msg)?;
                    let created = existing.is_none();
                    let mut device = existing.unwrap_or_else(|| Device::new(tenant_id, id));

                    if let Some(name) = &msg.name {
                        device.name = name.clone();
                    }
                    if let Some(device_type) = &msg.device_type {
                        device.device_type = device_type.clone();
                    }
                    device.label = msg.label.clone();
                    device.additional_info = parse_json(msg.additional_info.as_deref(), &msg)?;
                    device.customer_id = optional_id(msg.customer_id_msb, msg.customer_id_lsb);
                    device.device_profile_id =
                        optional_id(msg.device_profile_id_msb, msg.device_profile_id_lsb);
                    device.firmware_id = optional_id(msg.firmware_id_msb, msg.firmware_id_lsb);
                    device.software_id = optional_id(msg.software_id_msb, msg.software_id_lsb);

                    store.save(device).await.context(&msg)?;
                    created
                };
                debug!(tenant = %tenant_id, device = %id, created, "device applied");
                if created {
                    ctx.enqueue(
                        tenant_id,
                        SyncEventType::Device,
                        SyncEventAction::CredentialsRequest,
                        id,
                        None,
                    )
                    .await?;
                }
                ctx.request_additional_data(tenant_id, SyncEventType::Device, id)
                    .await?;
                Ok(ApplyOutcome::upserted(created))
            }
            UpdateMsgType::EntityDeleted => {
                let existed = store.delete(tenant_id, id).await.context(&msg)?;
                Ok(ApplyOutcome::deleted(existed))
            }
            other @ (UpdateMsgType::AlarmAck
            | UpdateMsgType::AlarmClear
            | UpdateMsgType::Unrecognized(_)) => Err(unsupported(Self::KIND, other)),
        }
    }

    async fn construct_outbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        event: &SyncEvent,
        msg_type: UpdateMsgType,
    ) -> SyncResult<Option<SyncMessage>> {
        let msg = match msg_type {
            UpdateMsgType::EntityDeleted => match decode_snapshot::<Device>(event)? {
                Some(device) => device_update_msg(msg_type, &device, None, None),
                None => device_delete_msg(event.entity_id),
            },
            _ => {
                let found = ctx
                    .collaborators
                    .devices
                    .find_by_id(tenant_id, event.entity_id)
                    .await
                    .context(event)?;
                match found {
                    Some(device) => device_update_msg(msg_type, &device, None, None),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(SyncMessage::Device(msg)))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;
    use crate::config::SyncConfig;
    use crate::error::SyncError;

    fn create_msg(id: EntityId) -> DeviceUpdateMsg {
        let (id_msb, id_lsb) = id.halves();
        let (profile_msb, profile_lsb) = EntityId::from_halves(3, 4).halves();
        DeviceUpdateMsg {
            msg_type: UpdateMsgType::EntityCreated,
            id_msb,
            id_lsb,
            device_profile_id_msb: Some(profile_msb),
            device_profile_id_lsb: Some(profile_lsb),
            name: Some("Thermo 7".into()),
            device_type: Some("thermostat".into()),
            ..DeviceUpdateMsg::default()
        }
    }

    #[tokio::test]
    async fn creation_requests_credentials_once() {
        let h = Harness::with_config(SyncConfig::default().with_request_additional_data(false));
        let id = EntityId::new();
        DeviceProcessor
            .apply_inbound(&h.ctx, h.tenant, create_msg(id))
            .await
            .unwrap();
        DeviceProcessor
            .apply_inbound(&h.ctx, h.tenant, create_msg(id))
            .await
            .unwrap();

        assert_eq!(
            h.actions(),
            vec![(SyncEventType::Device, "CREDENTIALS_REQUEST".to_string())]
        );
        let device = h.memory.devices.get(h.tenant, id).unwrap();
        assert_eq!(device.device_profile_id, Some(EntityId::from_halves(3, 4)));
    }

    #[tokio::test]
    async fn stores_the_name_the_peer_settled_on() {
        let h = Harness::new();
        let id = EntityId::new();
        let mut msg = create_msg(id);
        msg.conflict_name = Some("Thermo".into());
        DeviceProcessor
            .apply_inbound(&h.ctx, h.tenant, msg)
            .await
            .unwrap();
        assert_eq!(h.memory.devices.get(h.tenant, id).unwrap().name, "Thermo 7");
    }

    #[tokio::test]
    async fn credentials_for_missing_device_are_skipped() {
        let h = Harness::new();
        let msg = DeviceCredentialsUpdateMsg {
            device_id_msb: 1,
            device_id_lsb: 2,
            credentials_id: Some("token".into()),
            ..DeviceCredentialsUpdateMsg::default()
        };
        let outcome = DeviceProcessor
            .apply_credentials(&h.ctx, h.tenant, msg)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ApplyOutcome::Skipped(SkipReason::ReferenceMissing(_))
        ));
    }

    #[tokio::test]
    async fn credentials_are_stored_for_existing_device() {
        let h = Harness::new();
        let id = EntityId::new();
        DeviceProcessor
            .apply_inbound(&h.ctx, h.tenant, create_msg(id))
            .await
            .unwrap();

        let (device_id_msb, device_id_lsb) = id.halves();
        let msg = DeviceCredentialsUpdateMsg {
            device_id_msb,
            device_id_lsb,
            credentials_type: Some("MQTT_BASIC".into()),
            credentials_id: Some("client-1".into()),
            credentials_value: Some(r#"{"userName":"u"}"#.into()),
        };
        let outcome = DeviceProcessor
            .apply_credentials(&h.ctx, h.tenant, msg)
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);

        let stored = h.memory.device_credentials.get(h.tenant, id).unwrap();
        assert_eq!(stored.credentials_type, DeviceCredentialsType::MqttBasic);
        assert_eq!(stored.credentials_id, "client-1");
    }

    #[tokio::test]
    async fn unknown_credentials_type_is_decode_error() {
        let h = Harness::new();
        let id = EntityId::new();
        DeviceProcessor
            .apply_inbound(&h.ctx, h.tenant, create_msg(id))
            .await
            .unwrap();
        let (device_id_msb, device_id_lsb) = id.halves();
        let msg = DeviceCredentialsUpdateMsg {
            device_id_msb,
            device_id_lsb,
            credentials_type: Some("RETINA_SCAN".into()),
            ..DeviceCredentialsUpdateMsg::default()
        };
        let err = DeviceProcessor
            .apply_credentials(&h.ctx, h.tenant, msg)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
    }
}
