//! Device profile processor.
//!
//! A profile whose incoming name is taken by another profile is stored under
//! a suffixed name; replays keep that name.

use super::{
    decode_snapshot, optional_id, parse_enum, parse_json, random_letters, unsupported,
    EntityProcessor, ProcessorContext, StoreResultExt,
};
use crate::constructors::{device_profile_delete_msg, device_profile_update_msg};
use crate::error::SyncResult;
use crate::event::{SyncEvent, SyncEventAction, SyncEventType};
use crate::outcome::ApplyOutcome;
use async_trait::async_trait;
use edgesync_core::{
    ComponentLifecycleEvent, DeviceProfile, EntityId, EntityRef, EntityType, TenantId,
};
use edgesync_protocol::{DeviceProfileUpdateMsg, SyncMessage, UpdateMsgType};
use tracing::{debug, warn};

/// Synchronizes device profiles and drives OTA recalculation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceProfileProcessor;

impl DeviceProfileProcessor {
    /// Returns `name`, or a suffixed variant if another profile already uses it.
    async fn unique_name(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        id: EntityId,
        name: &str,
        msg: &DeviceProfileUpdateMsg,
    ) -> SyncResult<String> {
        let clash = ctx
            .collaborators
            .device_profiles
            .find_by_name(tenant_id, name)
            .await
            .context(msg)?
            .filter(|other| other.id != id);
        match clash {
            Some(other) => {
                let renamed = format!("{name}_{}", random_letters(ctx.config.conflict_suffix_length));
                warn!(
                    tenant = %tenant_id,
                    profile = %id,
                    existing = %other.id,
                    name,
                    renamed = %renamed,
                    "device profile name already taken"
                );
                Ok(renamed)
            }
            None => Ok(name.to_string()),
        }
    }
}

/// True if `stored` is `name`, or `name` renamed with a random letter suffix.
fn is_stored_as(stored: &str, name: &str, suffix_length: usize) -> bool {
    match stored.strip_prefix(name) {
        Some("") => true,
        Some(rest) => rest.strip_prefix('_').is_some_and(|suffix| {
            suffix.len() == suffix_length && suffix.chars().all(|c| c.is_ascii_alphabetic())
        }),
        None => false,
    }
}

#[async_trait]
impl EntityProcessor for DeviceProfileProcessor {
    type Msg = DeviceProfileUpdateMsg;
    const KIND: EntityType = EntityType::DeviceProfile;

    async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: DeviceProfileUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let id = EntityId::from_halves(msg.id_msb, msg.id_lsb);
        let store = &ctx.collaborators.device_profiles;
        match msg.msg_type {
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated => {
                let (profile, created, firmware_changed, software_changed) = {
                    let _guard = ctx.locks.acquire(Self::KIND, tenant_id).await;
                    let existing = store.find_by_id(tenant_id, id).await.context(&msg)?;
                    let created = existing.is_none();
                    let (prior_firmware, prior_software) = existing
                        .as_ref()
                        .map(|p| (p.firmware_id, p.software_id))
                        .unwrap_or_default();
                    let mut profile =
                        existing.unwrap_or_else(|| DeviceProfile::new(tenant_id, id));

                    if let Some(name) = &msg.name {
                        let keep = !created
                            && is_stored_as(&profile.name, name, ctx.config.conflict_suffix_length);
                        if !keep {
                            profile.name =
                                self.unique_name(ctx, tenant_id, id, name, &msg).await?;
                        }
                    }
                    profile.description = msg.description.clone();
                    profile.is_default = msg.default;
                    profile.profile_type = match msg.profile_type.as_deref() {
                        Some(raw) => parse_enum(raw, &msg)?,
                        None => Default::default(),
                    };
                    profile.transport_type = match msg.transport_type.as_deref() {
                        Some(raw) => parse_enum(raw, &msg)?,
                        None => Default::default(),
                    };
                    profile.provision_type = match msg.provision_type.as_deref() {
                        Some(raw) => parse_enum(raw, &msg)?,
                        None => Default::default(),
                    };
                    profile.provision_device_key = msg.provision_device_key.clone();
                    profile.image = msg.image.clone();
                    profile.profile_data = parse_json(msg.profile_data.as_deref(), &msg)?;
                    profile.default_rule_chain_id =
                        optional_id(msg.default_rule_chain_id_msb, msg.default_rule_chain_id_lsb)
                            .filter(|rule_chain| !rule_chain.is_nil());
                    profile.default_queue_name = msg
                        .default_queue_name
                        .clone()
                        .filter(|queue| !queue.trim().is_empty());
                    profile.firmware_id = optional_id(msg.firmware_id_msb, msg.firmware_id_lsb);
                    profile.software_id = optional_id(msg.software_id_msb, msg.software_id_lsb);

                    let (firmware_changed, software_changed) = if created {
                        (profile.firmware_id.is_some(), profile.software_id.is_some())
                    } else {
                        (
                            profile.firmware_id != prior_firmware,
                            profile.software_id != prior_software,
                        )
                    };
                    let profile = store.save(profile).await.context(&msg)?;
                    (profile, created, firmware_changed, software_changed)
                };
                debug!(
                    tenant = %tenant_id,
                    profile = %id,
                    created,
                    firmware_changed,
                    software_changed,
                    "device profile applied"
                );

                let collaborators = &ctx.collaborators;
                collaborators
                    .notifier
                    .on_device_profile_change(&profile)
                    .await
                    .context(&msg)?;
                let lifecycle = if created {
                    ComponentLifecycleEvent::Created
                } else {
                    ComponentLifecycleEvent::Updated
                };
                collaborators
                    .notifier
                    .broadcast_entity_state_change(
                        tenant_id,
                        EntityRef::new(Self::KIND, id),
                        lifecycle,
                    )
                    .await
                    .context(&msg)?;
                collaborators
                    .ota_state
                    .update(&profile, firmware_changed, software_changed)
                    .await
                    .context(&msg)?;
                if created {
                    ctx.enqueue(
                        tenant_id,
                        SyncEventType::DeviceProfile,
                        SyncEventAction::DeviceProfileDevicesRequest,
                        id,
                        None,
                    )
                    .await?;
                }
                Ok(ApplyOutcome::upserted(created))
            }
            UpdateMsgType::EntityDeleted => {
                let Some(profile) = store.find_by_id(tenant_id, id).await.context(&msg)? else {
                    return Ok(ApplyOutcome::NoOp);
                };
                let existed = store.delete(tenant_id, id).await.context(&msg)?;
                if existed {
                    let notifier = &ctx.collaborators.notifier;
                    notifier
                        .on_device_profile_delete(&profile)
                        .await
                        .context(&msg)?;
                    notifier
                        .broadcast_entity_state_change(
                            tenant_id,
                            EntityRef::new(Self::KIND, id),
                            ComponentLifecycleEvent::Deleted,
                        )
                        .await
                        .context(&msg)?;
                }
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
            UpdateMsgType::EntityDeleted => match decode_snapshot::<DeviceProfile>(event)? {
                Some(profile) => device_profile_update_msg(msg_type, &profile),
                None => device_profile_delete_msg(event.entity_id),
            },
            _ => {
                let found = ctx
                    .collaborators
                    .device_profiles
                    .find_by_id(tenant_id, event.entity_id)
                    .await
                    .context(event)?;
                match found {
                    Some(profile) => device_profile_update_msg(msg_type, &profile),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(SyncMessage::DeviceProfile(msg)))
    }
}
