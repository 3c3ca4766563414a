//! Relation processor: applies relations whose endpoints both exist locally.

use super::{parse_enum, parse_json, ProcessorContext, StoreResultExt};
use crate::constructors::relation_update_msg;
use crate::error::{SyncError, SyncResult};
use crate::event::SyncEvent;
use crate::outcome::{ApplyOutcome, SkipReason};
use edgesync_core::{EntityId, EntityRef, EntityRelation, EntityType, RelationTypeGroup, TenantId};
use edgesync_protocol::{RelationUpdateMsg, SyncMessage, UpdateMsgType};
use tracing::{debug, warn};

/// Synchronizes relations between already-synchronized entities.
///
/// Relations have no ID of their own. Sync events carry the relation in
/// their body, keyed by the source entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationProcessor;

impl RelationProcessor {
    fn decode(msg: &RelationUpdateMsg) -> SyncResult<EntityRelation> {
        let from_type: EntityType = parse_enum(&msg.from_entity_type, msg)?;
        let to_type: EntityType = parse_enum(&msg.to_entity_type, msg)?;
        let type_group = match msg.type_group.as_deref() {
            Some(raw) => parse_enum(raw, msg)?,
            None => RelationTypeGroup::Common,
        };
        Ok(EntityRelation {
            from: EntityRef::new(from_type, EntityId::from_halves(msg.from_id_msb, msg.from_id_lsb)),
            to: EntityRef::new(to_type, EntityId::from_halves(msg.to_id_msb, msg.to_id_lsb)),
            relation_type: msg.relation_type.clone(),
            type_group,
            additional_info: parse_json(msg.additional_info.as_deref(), msg)?,
        })
    }

    async fn missing_endpoint(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        relation: &EntityRelation,
        msg: &RelationUpdateMsg,
    ) -> SyncResult<Option<EntityRef>> {
        for endpoint in [relation.from, relation.to] {
            if !ctx
                .collaborators
                .entity_exists(tenant_id, endpoint)
                .await
                .context(msg)?
            {
                return Ok(Some(endpoint));
            }
        }
        Ok(None)
    }

    /// Applies a relation message received from the peer.
    pub async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: RelationUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let store = &ctx.collaborators.relations;
        match msg.msg_type {
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated => {
                let relation = Self::decode(&msg)?;
                if let Some(missing) = self.missing_endpoint(ctx, tenant_id, &relation, &msg).await? {
                    warn!(
                        tenant = %tenant_id,
                        from = %relation.from,
                        to = %relation.to,
                        missing = %missing,
                        "relation endpoint not found, message skipped"
                    );
                    return Ok(ApplyOutcome::Skipped(SkipReason::ReferenceMissing(missing)));
                }
                let created = store.save(tenant_id, relation).await.context(&msg)?;
                debug!(tenant = %tenant_id, created, "relation applied");
                Ok(ApplyOutcome::upserted(created))
            }
            UpdateMsgType::EntityDeleted => {
                let relation = Self::decode(&msg)?;
                let existed = store.delete(tenant_id, &relation.key()).await.context(&msg)?;
                Ok(ApplyOutcome::deleted(existed))
            }
            other @ (UpdateMsgType::AlarmAck
            | UpdateMsgType::AlarmClear
            | UpdateMsgType::Unrecognized(_)) => Err(SyncError::unsupported("RELATION", other)),
        }
    }

    /// Builds the message for a relation event, or `None` if the relation is gone.
    pub async fn construct_outbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        event: &SyncEvent,
        msg_type: UpdateMsgType,
    ) -> SyncResult<Option<SyncMessage>> {
        let relation: EntityRelation = match &event.entity_body {
            Some(body) => serde_json::from_value(body.clone())
                .map_err(|e| SyncError::decode(format!("{event:?}"), e))?,
            None => {
                return Err(SyncError::decode(
                    format!("{event:?}"),
                    "relation event without body",
                ))
            }
        };
        if msg_type != UpdateMsgType::EntityDeleted {
            let current = ctx
                .collaborators
                .relations
                .find(tenant_id, &relation.key())
                .await
                .context(event)?;
            return Ok(current
                .map(|current| SyncMessage::Relation(relation_update_msg(msg_type, &current))));
        }
        Ok(Some(SyncMessage::Relation(relation_update_msg(msg_type, &relation))))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Harness;
    use super::*;
    use crate::event::{SyncEventAction, SyncEventType};
    use edgesync_core::{Asset, Device, Edge};

    struct Endpoints {
        asset: Asset,
        device: Device,
    }

    fn seed(h: &Harness) -> Endpoints {
        let mut asset = Asset::new(h.tenant, EntityId::new());
        asset.name = "Building A".into();
        let mut device = Device::new(h.tenant, EntityId::new());
        device.name = "Meter 1".into();
        h.memory.assets.insert(asset.clone());
        h.memory.devices.insert(device.clone());
        Endpoints { asset, device }
    }

    fn contains(from: EntityRef, to: EntityRef) -> RelationUpdateMsg {
        relation_update_msg(
            UpdateMsgType::EntityCreated,
            &EntityRelation::new(from, to, "Contains"),
        )
    }

    #[tokio::test]
    async fn relation_between_existing_entities_is_saved() {
        let h = Harness::new();
        let e = seed(&h);
        let from = EntityRef::new(EntityType::Asset, e.asset.id);
        let to = EntityRef::new(EntityType::Device, e.device.id);

        let first = RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, contains(from, to))
            .await
            .unwrap();
        let second = RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, contains(from, to))
            .await
            .unwrap();
        assert_eq!(first, ApplyOutcome::Created);
        assert_eq!(second, ApplyOutcome::Updated);
        assert_eq!(h.memory.relations.len(), 1);
    }

    #[tokio::test]
    async fn missing_endpoint_is_soft_skip() {
        let h = Harness::new();
        let e = seed(&h);
        let from = EntityRef::new(EntityType::Asset, e.asset.id);
        let ghost = EntityRef::new(EntityType::Device, EntityId::new());

        let outcome = RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, contains(from, ghost))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            ApplyOutcome::Skipped(SkipReason::ReferenceMissing(ghost))
        );
        assert!(h.memory.relations.is_empty());
    }

    #[tokio::test]
    async fn edge_endpoint_is_accepted() {
        let h = Harness::new();
        let e = seed(&h);
        let edge = Edge::new(h.tenant, EntityId::new(), "Plant edge", "rk-1");
        h.memory.edges.insert(edge.clone());
        let from = EntityRef::new(EntityType::Edge, edge.id);
        let to = EntityRef::new(EntityType::Device, e.device.id);

        let outcome = RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, contains(from, to))
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Created);
        assert_eq!(h.memory.relations.len(), 1);
    }

    #[tokio::test]
    async fn unchecked_endpoint_kind_counts_as_missing() {
        let h = Harness::new();
        let e = seed(&h);
        let from = EntityRef::new(EntityType::Asset, e.asset.id);
        let profile = EntityRef::new(EntityType::DeviceProfile, EntityId::new());
        let outcome = RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, contains(from, profile))
            .await
            .unwrap();
        assert!(matches!(outcome, ApplyOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn delete_by_key() {
        let h = Harness::new();
        let e = seed(&h);
        let from = EntityRef::new(EntityType::Asset, e.asset.id);
        let to = EntityRef::new(EntityType::Device, e.device.id);
        RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, contains(from, to))
            .await
            .unwrap();

        let mut delete = contains(from, to);
        delete.msg_type = UpdateMsgType::EntityDeleted;
        let outcome = RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, delete.clone())
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Deleted);
        let again = RelationProcessor
            .apply_inbound(&h.ctx, h.tenant, delete)
            .await
            .unwrap();
        assert_eq!(again, ApplyOutcome::NoOp);
    }

    #[tokio::test]
    async fn outbound_checks_relation_still_exists() {
        let h = Harness::new();
        let e = seed(&h);
        let relation = EntityRelation::new(
            EntityRef::new(EntityType::Asset, e.asset.id),
            EntityRef::new(EntityType::Device, e.device.id),
            "Contains",
        );
        let event = SyncEvent::new(
            h.tenant,
            SyncEventType::Relation,
            SyncEventAction::Added,
            e.asset.id,
            Some(serde_json::to_value(&relation).unwrap()),
        );

        let stale = RelationProcessor
            .construct_outbound(&h.ctx, h.tenant, &event, UpdateMsgType::EntityCreated)
            .await
            .unwrap();
        assert!(stale.is_none());

        h.ctx
            .collaborators
            .relations
            .save(h.tenant, relation)
            .await
            .unwrap();
        let fresh = RelationProcessor
            .construct_outbound(&h.ctx, h.tenant, &event, UpdateMsgType::EntityCreated)
            .await
            .unwrap();
        let Some(SyncMessage::Relation(msg)) = fresh else {
            panic!("expected relation message");
        };
        assert_eq!(msg.relation_type, "Contains");
        assert_eq!(msg.type_group.as_deref(), Some("COMMON"));
    }

    #[tokio::test]
    async fn outbound_without_body_is_decode_error() {
        let h = Harness::new();
        let event = SyncEvent::new(
            h.tenant,
            SyncEventType::Relation,
            SyncEventAction::Deleted,
            EntityId::new(),
            None,
        );
        let err = RelationProcessor
            .construct_outbound(&h.ctx, h.tenant, &event, UpdateMsgType::EntityDeleted)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
    }
}
