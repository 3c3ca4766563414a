//! Asset processor: upserts and deletes assets, and queues asset updates for the peer.

use super::{
    decode_snapshot, optional_id, parse_json, unsupported, EntityProcessor, ProcessorContext,
    StoreResultExt,
};
use crate::constructors::{asset_delete_msg, asset_update_msg};
use crate::error::SyncResult;
use crate::event::{SyncEvent, SyncEventType};
use crate::outcome::ApplyOutcome;
use async_trait::async_trait;
use edgesync_core::{Asset, EntityId, EntityType, TenantId};
use edgesync_protocol::{AssetUpdateMsg, SyncMessage, UpdateMsgType};
use tracing::debug;

/// Synchronizes assets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetProcessor;

#[async_trait]
impl EntityProcessor for AssetProcessor {
    type Msg = AssetUpdateMsg;
    const KIND: EntityType = EntityType::Asset;

    async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: AssetUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let id = EntityId::from_halves(msg.id_msb, msg.id_lsb);
        let store = &ctx.collaborators.assets;
        match msg.msg_type {
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated => {
                let created = {
                    let _guard = ctx.locks.acquire(Self::KIND, tenant_id).await;
                    let existing = store.find_by_id(tenant_id, id).await.context(&msg)?;
                    let created = existing.is_none();
                    let mut asset = existing.unwrap_or_else(|| Asset::new(tenant_id, id));

                    if let Some(name) = &msg.name {
                        asset.name = name.clone();
                    }
                    if let Some(asset_type) = &msg.asset_type {
                        asset.asset_type = asset_type.clone();
                    }
                    asset.label = msg.label.clone();
                    asset.image = msg.image.clone();
                    asset.additional_info = parse_json(msg.additional_info.as_deref(), &msg)?;
                    asset.customer_id = optional_id(msg.customer_id_msb, msg.customer_id_lsb);

                    store.save(asset).await.context(&msg)?;
                    created
                };
                debug!(tenant = %tenant_id, asset = %id, created, "asset applied");
                ctx.request_additional_data(tenant_id, SyncEventType::Asset, id)
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
            UpdateMsgType::EntityDeleted => match decode_snapshot::<Asset>(event)? {
                Some(asset) => asset_update_msg(msg_type, &asset, None),
                None => asset_delete_msg(event.entity_id),
            },
            _ => {
                let found = ctx
                    .collaborators
                    .assets
                    .find_by_id(tenant_id, event.entity_id)
                    .await
                    .context(event)?;
                match found {
                    Some(asset) => asset_update_msg(msg_type, &asset, None),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(SyncMessage::Asset(msg)))
    }
}
