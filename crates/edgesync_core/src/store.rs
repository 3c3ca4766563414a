//! Collaborator traits over local persistent storage.
//!
//! The sync engine never talks to a storage engine directly. Every read and
//! write goes through these traits so deployments can plug in their own
//! persistence; [`crate::memory`] provides in-memory implementations.

use crate::attribute::{AttributeKv, AttributeScope};
use crate::entity_type::EntityRef;
use crate::error::StoreResult;
use crate::id::{EntityId, TenantId};
use crate::model::{Alarm, Credentials, Entity, EntityRelation, RelationKey};
use async_trait::async_trait;

/// Generic CRUD access to entities of one type.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Finds an entity by ID.
    async fn find_by_id(&self, tenant_id: TenantId, id: EntityId) -> StoreResult<Option<T>>;

    /// Finds an entity by its name within the tenant.
    async fn find_by_name(&self, tenant_id: TenantId, name: &str) -> StoreResult<Option<T>>;

    /// Lists every entity of the tenant.
    async fn find_all(&self, tenant_id: TenantId) -> StoreResult<Vec<T>>;

    /// Inserts or replaces an entity, returning the stored version.
    async fn save(&self, entity: T) -> StoreResult<T>;

    /// Deletes an entity. Returns true if it existed.
    async fn delete(&self, tenant_id: TenantId, id: EntityId) -> StoreResult<bool>;

    /// Returns true if the entity exists.
    async fn exists(&self, tenant_id: TenantId, id: EntityId) -> StoreResult<bool> {
        Ok(self.find_by_id(tenant_id, id).await?.is_some())
    }
}

/// Alarm storage with natural-key lookup.
#[async_trait]
pub trait AlarmStore: EntityStore<Alarm> {
    /// Finds the most recently created alarm of `alarm_type` raised by `originator`.
    async fn find_latest_by_originator_and_type(
        &self,
        tenant_id: TenantId,
        originator: EntityRef,
        alarm_type: &str,
    ) -> StoreResult<Option<Alarm>>;
}

/// Credentials keyed by their owner.
#[async_trait]
pub trait CredentialsStore<C: Credentials>: Send + Sync {
    /// Finds credentials by owner ID.
    async fn find_by_owner(&self, tenant_id: TenantId, owner_id: EntityId)
        -> StoreResult<Option<C>>;

    /// Inserts or replaces credentials.
    async fn save(&self, tenant_id: TenantId, credentials: C) -> StoreResult<C>;
}

/// Relation storage keyed by (from, to, type, group).
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Inserts or replaces a relation. Returns true if it did not exist.
    async fn save(&self, tenant_id: TenantId, relation: EntityRelation) -> StoreResult<bool>;

    /// Deletes a relation. Returns true if it existed.
    async fn delete(&self, tenant_id: TenantId, key: &RelationKey) -> StoreResult<bool>;

    /// Finds a relation by key.
    async fn find(
        &self,
        tenant_id: TenantId,
        key: &RelationKey,
    ) -> StoreResult<Option<EntityRelation>>;

    /// Lists relations originating at `from`.
    async fn find_by_from(
        &self,
        tenant_id: TenantId,
        from: EntityRef,
    ) -> StoreResult<Vec<EntityRelation>>;

    /// Lists relations pointing at `to`.
    async fn find_by_to(&self, tenant_id: TenantId, to: EntityRef)
        -> StoreResult<Vec<EntityRelation>>;
}

/// Per-entity keyed attributes.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Reads one attribute.
    async fn get(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        scope: AttributeScope,
        key: &str,
    ) -> StoreResult<Option<AttributeKv>>;

    /// Writes attributes, replacing existing keys.
    async fn save(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        scope: AttributeScope,
        attributes: Vec<AttributeKv>,
    ) -> StoreResult<()>;
}
