//! The sync engine façade used by transports.

use crate::collaborators::Collaborators;
use crate::config::SyncConfig;
use crate::constructors::{
    attributes_request_msg, device_credentials_request_msg, device_profile_devices_request_msg,
    relation_request_msg, user_credentials_request_msg,
};
use crate::error::{SyncError, SyncResult};
use crate::event::{SyncEvent, SyncEventAction, SyncEventType};
use crate::event_log::{EventCursor, SyncEventDao, SyncEventFilter, SyncEventLog, TimePageLink};
use crate::locks::CreationLocks;
use crate::outcome::ApplyOutcome;
use crate::pairing::EdgePairingRegistry;
use crate::processor::{
    snapshot, AlarmProcessor, AssetProcessor, DashboardProcessor, DeviceProcessor,
    DeviceProfileProcessor, EntityProcessor, ProcessorContext, RelationProcessor,
    StoreResultExt, UserProcessor,
};
use edgesync_core::{Entity, EntityId, EntityRef, EntityRelation, EntityType, TenantId};
use edgesync_protocol::{
    DeviceCredentialsRequestMsg, DeviceProfileDevicesRequestMsg, MessageBatch, RelationRequestMsg,
    SyncMessage, UpdateMsgType, UserCredentialsRequestMsg,
};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// Counters over the lifetime of an engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Inbound messages that mutated local state or queued events.
    pub messages_applied: u64,
    /// Inbound messages that were no-ops or soft skips.
    pub messages_skipped: u64,
    /// Inbound messages that failed.
    pub messages_failed: u64,
    /// Outbound messages built from events.
    pub events_constructed: u64,
    /// Events whose entity no longer existed.
    pub events_stale: u64,
}

/// Per-message results of [`SyncEngine::apply_batch`].
#[derive(Debug)]
pub struct BatchReport {
    /// ID of the applied batch.
    pub batch_id: i32,
    /// Outcome of each message, in application order, tagged with its kind.
    pub outcomes: Vec<(&'static str, SyncResult<ApplyOutcome>)>,
}

impl BatchReport {
    /// Number of messages that failed.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|(_, r)| r.is_err()).count()
    }

    /// Returns true if no message failed.
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }

    /// Returns true if a failed message is worth redelivering.
    pub fn has_retryable(&self) -> bool {
        self.outcomes
            .iter()
            .any(|(_, r)| matches!(r, Err(e) if e.is_retryable()))
    }
}

/// Result of draining one page of the event log.
#[derive(Debug, Default)]
pub struct DrainReport {
    /// One batch per deliverable event.
    pub batches: Vec<(EntityId, MessageBatch)>,
    /// Events whose entity is gone; safe to acknowledge without delivery.
    pub stale: Vec<EntityId>,
    /// Events that could not be turned into a message.
    pub failed: Vec<(EntityId, SyncError)>,
    /// Cursor for the next page, if any.
    pub next: Option<EventCursor>,
}

impl DrainReport {
    /// IDs of events that need no further processing once the batches are delivered.
    pub fn settled_ids(&self) -> Vec<EntityId> {
        self.batches
            .iter()
            .map(|(id, _)| *id)
            .chain(self.stale.iter().copied())
            .collect()
    }
}

/// Applies inbound messages and turns queued events into outbound messages.
pub struct SyncEngine {
    ctx: ProcessorContext,
    pairing: EdgePairingRegistry,
    stats: RwLock<SyncStats>,
}

impl SyncEngine {
    /// Creates an engine over `collaborators`, storing events in `events`.
    pub fn new(
        collaborators: Collaborators,
        events: Arc<dyn SyncEventDao>,
        config: SyncConfig,
    ) -> Self {
        let pairing = EdgePairingRegistry::new(collaborators.attributes.clone());
        let ctx = ProcessorContext {
            locks: Arc::new(CreationLocks::new(config.lock_scope)),
            event_log: SyncEventLog::new(events, config.cleanup_page_size),
            collaborators,
            config,
        };
        Self {
            ctx,
            pairing,
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.ctx.config
    }

    /// Context shared by the processors.
    pub fn context(&self) -> &ProcessorContext {
        &self.ctx
    }

    /// Outbound event log.
    pub fn event_log(&self) -> &SyncEventLog {
        &self.ctx.event_log
    }

    /// Edge pairing registry.
    pub fn pairing(&self) -> &EdgePairingRegistry {
        &self.pairing
    }

    /// Current counters.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Applies one message received from the peer.
    pub async fn apply_inbound(
        &self,
        tenant_id: TenantId,
        message: SyncMessage,
    ) -> SyncResult<ApplyOutcome> {
        let kind = message.kind_name();
        trace!(tenant = %tenant_id, kind, "applying inbound message");
        let ctx = &self.ctx;
        let result = match message {
            SyncMessage::Asset(msg) => AssetProcessor.apply_inbound(ctx, tenant_id, msg).await,
            SyncMessage::Alarm(msg) => AlarmProcessor.apply_inbound(ctx, tenant_id, msg).await,
            SyncMessage::Dashboard(msg) => {
                DashboardProcessor.apply_inbound(ctx, tenant_id, msg).await
            }
            SyncMessage::Device(msg) => DeviceProcessor.apply_inbound(ctx, tenant_id, msg).await,
            SyncMessage::DeviceCredentials(msg) => {
                DeviceProcessor.apply_credentials(ctx, tenant_id, msg).await
            }
            SyncMessage::DeviceProfile(msg) => {
                DeviceProfileProcessor.apply_inbound(ctx, tenant_id, msg).await
            }
            SyncMessage::User(msg) => UserProcessor.apply_inbound(ctx, tenant_id, msg).await,
            SyncMessage::UserCredentials(msg) => {
                UserProcessor.apply_credentials(ctx, tenant_id, msg).await
            }
            SyncMessage::Relation(msg) => {
                RelationProcessor.apply_inbound(ctx, tenant_id, msg).await
            }
            SyncMessage::RelationRequest(msg) => self.on_relation_request(tenant_id, msg).await,
            SyncMessage::AttributesRequest(_) => Err(SyncError::unsupported(
                "ATTRIBUTES",
                "attribute requests are answered by the telemetry layer",
            )),
            SyncMessage::UserCredentialsRequest(msg) => {
                self.on_user_credentials_request(tenant_id, msg).await
            }
            SyncMessage::DeviceCredentialsRequest(msg) => {
                self.on_device_credentials_request(tenant_id, msg).await
            }
            SyncMessage::DeviceProfileDevicesRequest(msg) => {
                self.on_device_profile_devices_request(tenant_id, msg).await
            }
        };

        let mut stats = self.stats.write();
        match &result {
            Ok(outcome) if outcome.is_mutation() => stats.messages_applied += 1,
            Ok(ApplyOutcome::Enqueued(_)) => stats.messages_applied += 1,
            Ok(_) => stats.messages_skipped += 1,
            Err(e) => {
                stats.messages_failed += 1;
                error!(tenant = %tenant_id, kind, error = %e, retryable = e.is_retryable(), "inbound message failed");
            }
        }
        result
    }

    /// Applies every message of a batch in order.
    ///
    /// A failing message does not stop the rest of the batch.
    pub async fn apply_batch(&self, tenant_id: TenantId, batch: MessageBatch) -> BatchReport {
        let batch_id = batch.batch_id;
        let messages = batch.into_messages();
        debug!(tenant = %tenant_id, batch_id, messages = messages.len(), "applying batch");
        let mut outcomes = Vec::with_capacity(messages.len());
        for message in messages {
            let kind = message.kind_name();
            outcomes.push((kind, self.apply_inbound(tenant_id, message).await));
        }
        BatchReport { batch_id, outcomes }
    }

    /// Builds the outbound batch for `event`, or `None` if its entity is gone.
    pub async fn construct_outbound(
        &self,
        tenant_id: TenantId,
        event: &SyncEvent,
    ) -> SyncResult<Option<MessageBatch>> {
        let action = event.parsed_action().map_err(|_| {
            SyncError::unsupported(
                event.entity_type.as_str(),
                format!("action {:?}", event.action),
            )
        })?;
        let message = self.construct_message(tenant_id, event, action).await?;
        let mut stats = self.stats.write();
        match &message {
            Some(_) => stats.events_constructed += 1,
            None => {
                stats.events_stale += 1;
                debug!(tenant = %tenant_id, event = %event.id, "stale sync event");
            }
        }
        Ok(message.map(MessageBatch::single))
    }

    async fn construct_message(
        &self,
        tenant_id: TenantId,
        event: &SyncEvent,
        action: SyncEventAction,
    ) -> SyncResult<Option<SyncMessage>> {
        let ctx = &self.ctx;
        let entity_type = event.entity_type;
        let msg_type = match action {
            SyncEventAction::Added => UpdateMsgType::EntityCreated,
            SyncEventAction::Updated => UpdateMsgType::EntityUpdated,
            SyncEventAction::Deleted => UpdateMsgType::EntityDeleted,
            SyncEventAction::AlarmAck | SyncEventAction::AlarmClear
                if entity_type != SyncEventType::Alarm =>
            {
                return Err(SyncError::unsupported(entity_type.as_str(), action));
            }
            SyncEventAction::AlarmAck => UpdateMsgType::AlarmAck,
            SyncEventAction::AlarmClear => UpdateMsgType::AlarmClear,
            SyncEventAction::CredentialsUpdated => {
                return match entity_type {
                    SyncEventType::User => {
                        UserProcessor.construct_credentials(ctx, tenant_id, event).await
                    }
                    SyncEventType::Device => {
                        DeviceProcessor
                            .construct_credentials(ctx, tenant_id, event)
                            .await
                    }
                    _ => Err(SyncError::unsupported(entity_type.as_str(), action)),
                };
            }
            SyncEventAction::CredentialsRequest => {
                return match entity_type {
                    SyncEventType::User => Ok(Some(SyncMessage::UserCredentialsRequest(
                        user_credentials_request_msg(event.entity_id),
                    ))),
                    SyncEventType::Device => Ok(Some(SyncMessage::DeviceCredentialsRequest(
                        device_credentials_request_msg(event.entity_id),
                    ))),
                    _ => Err(SyncError::unsupported(entity_type.as_str(), action)),
                };
            }
            SyncEventAction::AttributesRequest | SyncEventAction::RelationRequest => {
                let Some(kind) = entity_type.entity_type() else {
                    return Err(SyncError::unsupported(entity_type.as_str(), action));
                };
                let entity = EntityRef::new(kind, event.entity_id);
                let issued = event.created_time;
                return Ok(Some(if action == SyncEventAction::AttributesRequest {
                    SyncMessage::AttributesRequest(attributes_request_msg(entity, issued))
                } else {
                    SyncMessage::RelationRequest(relation_request_msg(entity, issued))
                }));
            }
            SyncEventAction::DeviceProfileDevicesRequest => {
                return match entity_type {
                    SyncEventType::DeviceProfile => {
                        Ok(Some(SyncMessage::DeviceProfileDevicesRequest(
                            device_profile_devices_request_msg(event.entity_id),
                        )))
                    }
                    _ => Err(SyncError::unsupported(entity_type.as_str(), action)),
                };
            }
        };

        match entity_type {
            SyncEventType::Asset => {
                AssetProcessor
                    .construct_outbound(ctx, tenant_id, event, msg_type)
                    .await
            }
            SyncEventType::Alarm => {
                AlarmProcessor
                    .construct_outbound(ctx, tenant_id, event, msg_type)
                    .await
            }
            SyncEventType::Dashboard => {
                DashboardProcessor
                    .construct_outbound(ctx, tenant_id, event, msg_type)
                    .await
            }
            SyncEventType::Device => {
                DeviceProcessor
                    .construct_outbound(ctx, tenant_id, event, msg_type)
                    .await
            }
            SyncEventType::DeviceProfile => {
                DeviceProfileProcessor
                    .construct_outbound(ctx, tenant_id, event, msg_type)
                    .await
            }
            SyncEventType::User => {
                UserProcessor
                    .construct_outbound(ctx, tenant_id, event, msg_type)
                    .await
            }
            SyncEventType::Relation => {
                RelationProcessor
                    .construct_outbound(ctx, tenant_id, event, msg_type)
                    .await
            }
            SyncEventType::Customer | SyncEventType::EntityView | SyncEventType::Edge => {
                Err(SyncError::unsupported(entity_type.as_str(), msg_type))
            }
        }
    }

    /// Pages the event log and builds a batch per event.
    ///
    /// Nothing is removed; pass [`DrainReport::settled_ids`] to
    /// [`SyncEngine::acknowledge`] once the batches were delivered.
    pub async fn drain(
        &self,
        tenant_id: TenantId,
        page_link: &TimePageLink,
    ) -> SyncResult<DrainReport> {
        let page = self
            .ctx
            .event_log
            .page(tenant_id, &SyncEventFilter::all(), page_link)
            .await?;
        let mut report = DrainReport {
            next: page.next,
            ..DrainReport::default()
        };
        for event in &page.data {
            match self.construct_outbound(tenant_id, event).await {
                Ok(Some(batch)) => report.batches.push((event.id, batch)),
                Ok(None) => report.stale.push(event.id),
                Err(e) => {
                    warn!(tenant = %tenant_id, event = %event.id, error = %e, "sync event not deliverable");
                    report.failed.push((event.id, e));
                }
            }
        }
        debug!(
            tenant = %tenant_id,
            batches = report.batches.len(),
            stale = report.stale.len(),
            failed = report.failed.len(),
            "drained sync events"
        );
        Ok(report)
    }

    /// Page link sized by the configured drain page size.
    pub fn drain_page_link(&self) -> TimePageLink {
        TimePageLink::new(self.ctx.config.drain_page_size)
    }

    /// Removes delivered events. Returns how many existed.
    pub async fn acknowledge(&self, tenant_id: TenantId, event_ids: &[EntityId]) -> SyncResult<usize> {
        let mut removed = 0;
        for id in event_ids {
            if self.ctx.event_log.remove(tenant_id, *id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes events older than the configured TTL.
    pub async fn cleanup(&self) -> SyncResult<usize> {
        self.ctx.event_log.cleanup(self.ctx.config.event_ttl).await
    }

    /// Deletes every queued event of a tenant.
    pub async fn delete_all_for_tenant(&self, tenant_id: TenantId) -> SyncResult<usize> {
        self.ctx.event_log.delete_all_for_tenant(tenant_id).await
    }

    /// Queues a local entity change for delivery to the peer.
    ///
    /// Deletions carry a snapshot of the entity so the peer still gets its
    /// last known state.
    pub async fn record_entity_change<T: Entity>(
        &self,
        action: SyncEventAction,
        entity: &T,
    ) -> SyncResult<()> {
        let Some(entity_type) = SyncEventType::from_entity_type(T::ENTITY_TYPE) else {
            return Err(SyncError::unsupported(T::ENTITY_TYPE.as_str(), action));
        };
        let body = match action {
            SyncEventAction::Deleted => Some(snapshot(entity)?),
            _ => None,
        };
        self.ctx
            .enqueue(entity.tenant_id(), entity_type, action, entity.id(), body)
            .await
    }

    /// Queues a local relation change for delivery to the peer.
    pub async fn record_relation_change(
        &self,
        tenant_id: TenantId,
        action: SyncEventAction,
        relation: &EntityRelation,
    ) -> SyncResult<()> {
        self.ctx
            .enqueue(
                tenant_id,
                SyncEventType::Relation,
                action,
                relation.from.id,
                Some(snapshot(relation)?),
            )
            .await
    }

    async fn on_user_credentials_request(
        &self,
        tenant_id: TenantId,
        msg: UserCredentialsRequestMsg,
    ) -> SyncResult<ApplyOutcome> {
        let user_id = EntityId::from_halves(msg.user_id_msb, msg.user_id_lsb);
        self.ctx
            .enqueue(
                tenant_id,
                SyncEventType::User,
                SyncEventAction::CredentialsUpdated,
                user_id,
                None,
            )
            .await?;
        Ok(ApplyOutcome::Enqueued(1))
    }

    async fn on_device_credentials_request(
        &self,
        tenant_id: TenantId,
        msg: DeviceCredentialsRequestMsg,
    ) -> SyncResult<ApplyOutcome> {
        let device_id = EntityId::from_halves(msg.device_id_msb, msg.device_id_lsb);
        self.ctx
            .enqueue(
                tenant_id,
                SyncEventType::Device,
                SyncEventAction::CredentialsUpdated,
                device_id,
                None,
            )
            .await?;
        Ok(ApplyOutcome::Enqueued(1))
    }

    async fn on_relation_request(
        &self,
        tenant_id: TenantId,
        msg: RelationRequestMsg,
    ) -> SyncResult<ApplyOutcome> {
        let entity_type: EntityType = msg
            .entity_type
            .parse()
            .map_err(|e| SyncError::decode(format!("{msg:?}"), e))?;
        let entity = EntityRef::new(
            entity_type,
            EntityId::from_halves(msg.entity_id_msb, msg.entity_id_lsb),
        );
        let relations = &self.ctx.collaborators.relations;
        let mut found = BTreeMap::new();
        for relation in relations
            .find_by_from(tenant_id, entity)
            .await
            .context(&msg)?
            .into_iter()
            .chain(relations.find_by_to(tenant_id, entity).await.context(&msg)?)
        {
            found.insert(relation.key(), relation);
        }
        for relation in found.values() {
            self.record_relation_change(tenant_id, SyncEventAction::Added, relation)
                .await?;
        }
        debug!(
            tenant = %tenant_id,
            %entity,
            issued = msg.ts,
            relations = found.len(),
            "relation request answered"
        );
        Ok(ApplyOutcome::Enqueued(found.len()))
    }

    async fn on_device_profile_devices_request(
        &self,
        tenant_id: TenantId,
        msg: DeviceProfileDevicesRequestMsg,
    ) -> SyncResult<ApplyOutcome> {
        let profile_id =
            EntityId::from_halves(msg.device_profile_id_msb, msg.device_profile_id_lsb);
        let devices = self
            .ctx
            .collaborators
            .devices
            .find_all(tenant_id)
            .await
            .context(&msg)?;
        let mut queued = 0;
        for device in devices
            .iter()
            .filter(|device| device.device_profile_id == Some(profile_id))
        {
            self.record_entity_change(SyncEventAction::Added, device)
                .await?;
            queued += 1;
        }
        Ok(ApplyOutcome::Enqueued(queued))
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.ctx.config)
            .field("stats", &*self.stats.read())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::InMemoryCollaborators;
    use crate::event_log::MemorySyncEventDao;
    use edgesync_core::{Asset, Device};
    use edgesync_protocol::AssetUpdateMsg;

    fn engine() -> (SyncEngine, InMemoryCollaborators, Arc<MemorySyncEventDao>) {
        let memory = InMemoryCollaborators::new();
        let events = Arc::new(MemorySyncEventDao::new());
        let engine = SyncEngine::new(
            memory.collaborators(),
            events.clone(),
            SyncConfig::default().with_request_additional_data(false),
        );
        (engine, memory, events)
    }

    #[tokio::test]
    async fn batch_failure_does_not_abort_siblings() {
        let (engine, memory, _) = engine();
        let tenant = TenantId::new();
        let good = EntityId::new();
        let (id_msb, id_lsb) = good.halves();

        let mut batch = MessageBatch::new();
        batch.push(SyncMessage::Asset(AssetUpdateMsg {
            msg_type: UpdateMsgType::Unrecognized(42),
            ..AssetUpdateMsg::default()
        }));
        batch.push(SyncMessage::Asset(AssetUpdateMsg {
            msg_type: UpdateMsgType::EntityCreated,
            id_msb,
            id_lsb,
            name: Some("Tank".into()),
            ..AssetUpdateMsg::default()
        }));

        let report = engine.apply_batch(tenant, batch).await;
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.failures(), 1);
        assert!(!report.has_retryable());
        assert!(memory.assets.get(tenant, good).is_some());

        let stats = engine.stats();
        assert_eq!(stats.messages_applied, 1);
        assert_eq!(stats.messages_failed, 1);
    }

    #[tokio::test]
    async fn additional_data_requests_carry_issue_time() {
        let memory = InMemoryCollaborators::new();
        let events = Arc::new(MemorySyncEventDao::new());
        let engine = SyncEngine::new(memory.collaborators(), events.clone(), SyncConfig::default());
        let tenant = TenantId::new();
        let id = EntityId::new();
        let (id_msb, id_lsb) = id.halves();
        engine
            .apply_inbound(
                tenant,
                SyncMessage::Asset(AssetUpdateMsg {
                    msg_type: UpdateMsgType::EntityCreated,
                    id_msb,
                    id_lsb,
                    name: Some("Tank".into()),
                    ..AssetUpdateMsg::default()
                }),
            )
            .await
            .unwrap();

        let queued = events.events(tenant);
        assert_eq!(queued.len(), 2);
        let issued = queued[0].created_time;
        assert_eq!(queued[1].created_time, issued);
        let by_action = |action: SyncEventAction| {
            queued
                .iter()
                .find(|e| e.action == action.as_str())
                .unwrap()
                .clone()
        };

        let attributes = engine
            .construct_outbound(tenant, &by_action(SyncEventAction::AttributesRequest))
            .await
            .unwrap()
            .unwrap();
        let relations = engine
            .construct_outbound(tenant, &by_action(SyncEventAction::RelationRequest))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attributes.attributes_request_msgs.len(), 1);
        assert_eq!(attributes.attributes_request_msgs[0].ts, issued);
        assert_eq!(relations.relation_request_msgs.len(), 1);
        assert_eq!(relations.relation_request_msgs[0].ts, issued);
        assert_eq!(relations.relation_request_msgs[0].entity_type, "ASSET");
    }

    #[tokio::test]
    async fn unknown_action_is_unsupported() {
        let (engine, _, _) = engine();
        let tenant = TenantId::new();
        let mut event = SyncEvent::new(
            tenant,
            SyncEventType::Asset,
            SyncEventAction::Added,
            EntityId::new(),
            None,
        );
        event.action = "TELEPORTED".into();
        let err = engine.construct_outbound(tenant, &event).await.unwrap_err();
        assert!(matches!(err, SyncError::Unsupported { kind: "ASSET", .. }));
    }

    #[tokio::test]
    async fn ack_action_only_for_alarms() {
        let (engine, _, _) = engine();
        let tenant = TenantId::new();
        let event = SyncEvent::new(
            tenant,
            SyncEventType::Asset,
            SyncEventAction::AlarmAck,
            EntityId::new(),
            None,
        );
        assert!(engine.construct_outbound(tenant, &event).await.is_err());
    }

    #[tokio::test]
    async fn credentials_request_queues_credentials_update() {
        let (engine, _, events) = engine();
        let tenant = TenantId::new();
        let device = EntityId::new();
        let (device_id_msb, device_id_lsb) = device.halves();
        let outcome = engine
            .apply_inbound(
                tenant,
                SyncMessage::DeviceCredentialsRequest(DeviceCredentialsRequestMsg {
                    device_id_msb,
                    device_id_lsb,
                }),
            )
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Enqueued(1));

        let queued = events.events(tenant);
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].action, "CREDENTIALS_UPDATED");
        assert_eq!(queued[0].entity_id, device);
    }

    #[tokio::test]
    async fn profile_devices_request_queues_matching_devices() {
        let (engine, memory, events) = engine();
        let tenant = TenantId::new();
        let profile = EntityId::new();
        for with_profile in [true, true, false] {
            let mut device = Device::new(tenant, EntityId::new());
            device.device_profile_id = with_profile.then_some(profile);
            memory.devices.insert(device);
        }

        let (device_profile_id_msb, device_profile_id_lsb) = profile.halves();
        let outcome = engine
            .apply_inbound(
                tenant,
                SyncMessage::DeviceProfileDevicesRequest(DeviceProfileDevicesRequestMsg {
                    device_profile_id_msb,
                    device_profile_id_lsb,
                }),
            )
            .await
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Enqueued(2));
        assert!(events
            .events(tenant)
            .iter()
            .all(|e| e.entity_type == SyncEventType::Device && e.action == "ADDED"));
    }

    #[tokio::test]
    async fn deletion_records_snapshot() {
        let (engine, _, events) = engine();
        let tenant = TenantId::new();
        let mut asset = Asset::new(tenant, EntityId::new());
        asset.name = "Silo".into();
        engine
            .record_entity_change(SyncEventAction::Deleted, &asset)
            .await
            .unwrap();

        let event = events.events(tenant).remove(0);
        let batch = engine.construct_outbound(tenant, &event).await.unwrap().unwrap();
        assert_eq!(batch.asset_update_msgs[0].name.as_deref(), Some("Silo"));
        assert_eq!(batch.asset_update_msgs[0].msg_type, UpdateMsgType::EntityDeleted);
    }

    #[tokio::test]
    async fn attributes_request_is_unsupported() {
        let (engine, _, _) = engine();
        let err = engine
            .apply_inbound(
                TenantId::new(),
                SyncMessage::AttributesRequest(Default::default()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Unsupported { kind: "ATTRIBUTES", .. }));
    }
}
