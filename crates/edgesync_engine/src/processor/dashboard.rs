//! Dashboard processor.

use super::{
    decode_snapshot, optional_id, parse_json, unsupported, EntityProcessor, ProcessorContext,
    StoreResultExt,
};
use crate::constructors::{dashboard_delete_msg, dashboard_update_msg};
use crate::error::SyncResult;
use crate::event::{SyncEvent, SyncEventType};
use crate::outcome::ApplyOutcome;
use async_trait::async_trait;
use edgesync_core::{Dashboard, EntityId, EntityType, TenantId};
use edgesync_protocol::{DashboardUpdateMsg, SyncMessage, UpdateMsgType};
use tracing::debug;

/// Synchronizes dashboards and their customer assignment.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardProcessor;

#[async_trait]
impl EntityProcessor for DashboardProcessor {
    type Msg = DashboardUpdateMsg;
    const KIND: EntityType = EntityType::Dashboard;

    async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: DashboardUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let id = EntityId::from_halves(msg.id_msb, msg.id_lsb);
        let store = &ctx.collaborators.dashboards;
        match msg.msg_type {
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated => {
                let created = {
                    let _guard = ctx.locks.acquire(Self::KIND, tenant_id).await;
                    let existing = store.find_by_id(tenant_id, id).await.context(&msg)?;
                    let created = existing.is_none();
                    let mut dashboard =
                        existing.unwrap_or_else(|| Dashboard::new(tenant_id, id));

                    if let Some(title) = &msg.title {
                        dashboard.title = title.clone();
                    }
                    dashboard.configuration = parse_json(msg.configuration.as_deref(), &msg)?;
                    match optional_id(msg.customer_id_msb, msg.customer_id_lsb) {
                        Some(customer_id) => {
                            dashboard.assign_customer(customer_id);
                        }
                        None => dashboard.unassign_all_customers(),
                    }

                    store.save(dashboard).await.context(&msg)?;
                    created
                };
                debug!(tenant = %tenant_id, dashboard = %id, created, "dashboard applied");
                ctx.request_additional_data(tenant_id, SyncEventType::Dashboard, id)
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
            UpdateMsgType::EntityDeleted => match decode_snapshot::<Dashboard>(event)? {
                Some(dashboard) => dashboard_update_msg(msg_type, &dashboard, None),
                None => dashboard_delete_msg(event.entity_id),
            },
            _ => {
                let found = ctx
                    .collaborators
                    .dashboards
                    .find_by_id(tenant_id, event.entity_id)
                    .await
                    .context(event)?;
                match found {
                    Some(dashboard) => dashboard_update_msg(msg_type, &dashboard, None),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(SyncMessage::Dashboard(msg)))
    }
}
