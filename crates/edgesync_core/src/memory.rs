//! In-memory collaborators for testing.
//!
//! Every store here can be switched unavailable with `set_available(false)`
//! to exercise error paths, the same way a flaky database would fail.

use crate::attribute::{AttributeKv, AttributeScope};
use crate::entity_type::EntityRef;
use crate::error::{StoreError, StoreResult};
use crate::id::{EntityId, TenantId};
use crate::model::{Alarm, Credentials, DeviceProfile, Entity, EntityRelation, RelationKey};
use crate::notify::{ClusterNotifier, ComponentLifecycleEvent, OtaStateRecalculator};
use crate::store::{AlarmStore, AttributeStore, CredentialsStore, EntityStore, RelationStore};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

/// Availability switch shared by the in-memory stores.
#[derive(Debug)]
struct Availability(AtomicBool);

impl Default for Availability {
    fn default() -> Self {
        Self(AtomicBool::new(true))
    }
}

impl Availability {
    fn set(&self, available: bool) {
        self.0.store(available, Ordering::SeqCst);
    }

    fn check(&self, store: &str) -> StoreResult<()> {
        if self.0.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(format!("{store} is offline")))
        }
    }
}

/// An in-memory [`EntityStore`].
#[derive(Debug)]
pub struct MemoryEntityStore<T> {
    entities: RwLock<HashMap<(TenantId, EntityId), T>>,
    available: Availability,
}

impl<T> Default for MemoryEntityStore<T> {
    fn default() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            available: Availability::default(),
        }
    }
}

impl<T: Entity> MemoryEntityStore<T> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`] (or succeed again).
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Inserts an entity directly, bypassing availability.
    pub fn insert(&self, entity: T) {
        self.entities
            .write()
            .insert((entity.tenant_id(), entity.id()), entity);
    }

    /// Returns the number of stored entities across tenants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.read().len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.read().is_empty()
    }

    /// Returns a stored entity, bypassing availability.
    #[must_use]
    pub fn get(&self, tenant_id: TenantId, id: EntityId) -> Option<T> {
        self.entities.read().get(&(tenant_id, id)).cloned()
    }

    fn tenant_entities(&self, tenant_id: TenantId) -> Vec<T> {
        let mut found: Vec<T> = self
            .entities
            .read()
            .iter()
            .filter(|((tenant, _), _)| *tenant == tenant_id)
            .map(|(_, entity)| entity.clone())
            .collect();
        found.sort_by_key(|entity| entity.id());
        found
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MemoryEntityStore<T> {
    async fn find_by_id(&self, tenant_id: TenantId, id: EntityId) -> StoreResult<Option<T>> {
        self.available.check(T::ENTITY_TYPE.as_str())?;
        Ok(self.get(tenant_id, id))
    }

    async fn find_by_name(&self, tenant_id: TenantId, name: &str) -> StoreResult<Option<T>> {
        self.available.check(T::ENTITY_TYPE.as_str())?;
        Ok(self
            .tenant_entities(tenant_id)
            .into_iter()
            .find(|entity| entity.name() == name))
    }

    async fn find_all(&self, tenant_id: TenantId) -> StoreResult<Vec<T>> {
        self.available.check(T::ENTITY_TYPE.as_str())?;
        Ok(self.tenant_entities(tenant_id))
    }

    async fn save(&self, entity: T) -> StoreResult<T> {
        self.available.check(T::ENTITY_TYPE.as_str())?;
        self.insert(entity.clone());
        Ok(entity)
    }

    async fn delete(&self, tenant_id: TenantId, id: EntityId) -> StoreResult<bool> {
        self.available.check(T::ENTITY_TYPE.as_str())?;
        Ok(self.entities.write().remove(&(tenant_id, id)).is_some())
    }
}

#[async_trait]
impl AlarmStore for MemoryEntityStore<Alarm> {
    async fn find_latest_by_originator_and_type(
        &self,
        tenant_id: TenantId,
        originator: EntityRef,
        alarm_type: &str,
    ) -> StoreResult<Option<Alarm>> {
        self.available.check("ALARM")?;
        Ok(self
            .tenant_entities(tenant_id)
            .into_iter()
            .filter(|alarm| alarm.originator == originator && alarm.alarm_type == alarm_type)
            .max_by_key(|alarm| (alarm.created_time, alarm.start_ts)))
    }
}

/// An in-memory [`CredentialsStore`].
#[derive(Debug)]
pub struct MemoryCredentialsStore<C> {
    credentials: RwLock<HashMap<(TenantId, EntityId), C>>,
    available: Availability,
}

impl<C> Default for MemoryCredentialsStore<C> {
    fn default() -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
            available: Availability::default(),
        }
    }
}

impl<C: Credentials> MemoryCredentialsStore<C> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles availability.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Returns stored credentials, bypassing availability.
    #[must_use]
    pub fn get(&self, tenant_id: TenantId, owner_id: EntityId) -> Option<C> {
        self.credentials.read().get(&(tenant_id, owner_id)).cloned()
    }
}

#[async_trait]
impl<C: Credentials> CredentialsStore<C> for MemoryCredentialsStore<C> {
    async fn find_by_owner(
        &self,
        tenant_id: TenantId,
        owner_id: EntityId,
    ) -> StoreResult<Option<C>> {
        self.available.check("credentials")?;
        Ok(self.get(tenant_id, owner_id))
    }

    async fn save(&self, tenant_id: TenantId, credentials: C) -> StoreResult<C> {
        self.available.check("credentials")?;
        self.credentials
            .write()
            .insert((tenant_id, credentials.owner_id()), credentials.clone());
        Ok(credentials)
    }
}

/// An in-memory [`RelationStore`].
#[derive(Debug, Default)]
pub struct MemoryRelationStore {
    relations: RwLock<BTreeMap<(TenantId, RelationKey), EntityRelation>>,
    available: Availability,
}

impl MemoryRelationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles availability.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }

    /// Returns the number of stored relations across tenants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.relations.read().len()
    }

    /// Returns true if no relation is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.relations.read().is_empty()
    }

    fn matching(
        &self,
        tenant_id: TenantId,
        predicate: impl Fn(&EntityRelation) -> bool,
    ) -> Vec<EntityRelation> {
        self.relations
            .read()
            .iter()
            .filter(|((tenant, _), relation)| *tenant == tenant_id && predicate(relation))
            .map(|(_, relation)| relation.clone())
            .collect()
    }
}

#[async_trait]
impl RelationStore for MemoryRelationStore {
    async fn save(&self, tenant_id: TenantId, relation: EntityRelation) -> StoreResult<bool> {
        self.available.check("relations")?;
        let previous = self
            .relations
            .write()
            .insert((tenant_id, relation.key()), relation);
        Ok(previous.is_none())
    }

    async fn delete(&self, tenant_id: TenantId, key: &RelationKey) -> StoreResult<bool> {
        self.available.check("relations")?;
        Ok(self
            .relations
            .write()
            .remove(&(tenant_id, key.clone()))
            .is_some())
    }

    async fn find(
        &self,
        tenant_id: TenantId,
        key: &RelationKey,
    ) -> StoreResult<Option<EntityRelation>> {
        self.available.check("relations")?;
        Ok(self.relations.read().get(&(tenant_id, key.clone())).cloned())
    }

    async fn find_by_from(
        &self,
        tenant_id: TenantId,
        from: EntityRef,
    ) -> StoreResult<Vec<EntityRelation>> {
        self.available.check("relations")?;
        Ok(self.matching(tenant_id, |relation| relation.from == from))
    }

    async fn find_by_to(
        &self,
        tenant_id: TenantId,
        to: EntityRef,
    ) -> StoreResult<Vec<EntityRelation>> {
        self.available.check("relations")?;
        Ok(self.matching(tenant_id, |relation| relation.to == to))
    }
}

type AttributeKey = (TenantId, EntityRef, AttributeScope, String);

/// An in-memory [`AttributeStore`].
#[derive(Debug, Default)]
pub struct MemoryAttributeStore {
    attributes: RwLock<HashMap<AttributeKey, AttributeKv>>,
    available: Availability,
}

impl MemoryAttributeStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles availability.
    pub fn set_available(&self, available: bool) {
        self.available.set(available);
    }
}

#[async_trait]
impl AttributeStore for MemoryAttributeStore {
    async fn get(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        scope: AttributeScope,
        key: &str,
    ) -> StoreResult<Option<AttributeKv>> {
        self.available.check("attributes")?;
        Ok(self
            .attributes
            .read()
            .get(&(tenant_id, entity, scope, key.to_string()))
            .cloned())
    }

    async fn save(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        scope: AttributeScope,
        attributes: Vec<AttributeKv>,
    ) -> StoreResult<()> {
        self.available.check("attributes")?;
        let mut stored = self.attributes.write();
        for attribute in attributes {
            stored.insert((tenant_id, entity, scope, attribute.key.clone()), attribute);
        }
        Ok(())
    }
}

/// A call observed by [`RecordingClusterNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    /// `broadcast_entity_state_change`.
    StateChange {
        /// Tenant.
        tenant_id: TenantId,
        /// Entity.
        entity: EntityRef,
        /// Lifecycle event.
        event: ComponentLifecycleEvent,
    },
    /// `on_device_profile_change`.
    ProfileChanged(EntityId),
    /// `on_device_profile_delete`.
    ProfileDeleted(EntityId),
}

/// A [`ClusterNotifier`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingClusterNotifier {
    calls: Mutex<Vec<NotifierCall>>,
}

impl RecordingClusterNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded calls in order.
    #[must_use]
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ClusterNotifier for RecordingClusterNotifier {
    async fn broadcast_entity_state_change(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        event: ComponentLifecycleEvent,
    ) -> StoreResult<()> {
        self.calls.lock().push(NotifierCall::StateChange {
            tenant_id,
            entity,
            event,
        });
        Ok(())
    }

    async fn on_device_profile_change(&self, profile: &DeviceProfile) -> StoreResult<()> {
        self.calls
            .lock()
            .push(NotifierCall::ProfileChanged(profile.id));
        Ok(())
    }

    async fn on_device_profile_delete(&self, profile: &DeviceProfile) -> StoreResult<()> {
        self.calls
            .lock()
            .push(NotifierCall::ProfileDeleted(profile.id));
        Ok(())
    }
}

/// A single [`OtaStateRecalculator::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtaUpdate {
    /// Profile that was saved.
    pub profile_id: EntityId,
    /// Whether the firmware assignment changed.
    pub firmware_changed: bool,
    /// Whether the software assignment changed.
    pub software_changed: bool,
}

/// An [`OtaStateRecalculator`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingOtaStateRecalculator {
    updates: Mutex<Vec<OtaUpdate>>,
}

impl RecordingOtaStateRecalculator {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded updates in order.
    #[must_use]
    pub fn updates(&self) -> Vec<OtaUpdate> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl OtaStateRecalculator for RecordingOtaStateRecalculator {
    async fn update(
        &self,
        profile: &DeviceProfile,
        firmware_changed: bool,
        software_changed: bool,
    ) -> StoreResult<()> {
        self.updates.lock().push(OtaUpdate {
            profile_id: profile.id,
            firmware_changed,
            software_changed,
        });
        Ok(())
    }
}
