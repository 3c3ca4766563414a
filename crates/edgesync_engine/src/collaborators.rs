//! The set of collaborators the processors work through.

use edgesync_core::memory::{
    MemoryAttributeStore, MemoryCredentialsStore, MemoryEntityStore, MemoryRelationStore,
    RecordingClusterNotifier, RecordingOtaStateRecalculator,
};
use edgesync_core::{
    Alarm, AlarmStore, Asset, AttributeStore, ClusterNotifier, CredentialsStore, Customer,
    Dashboard, Device, DeviceCredentials, DeviceProfile, Edge, Entity, EntityRef, EntityStore,
    EntityType, EntityView, OtaStateRecalculator, RelationStore, StoreResult, TenantId, User,
    UserCredentials,
};
use std::sync::Arc;

/// Storage and side-effect collaborators.
#[derive(Clone)]
pub struct Collaborators {
    /// Assets.
    pub assets: Arc<dyn EntityStore<Asset>>,
    /// Alarms.
    pub alarms: Arc<dyn AlarmStore>,
    /// Dashboards.
    pub dashboards: Arc<dyn EntityStore<Dashboard>>,
    /// Devices.
    pub devices: Arc<dyn EntityStore<Device>>,
    /// Device profiles.
    pub device_profiles: Arc<dyn EntityStore<DeviceProfile>>,
    /// Users.
    pub users: Arc<dyn EntityStore<User>>,
    /// Customers.
    pub customers: Arc<dyn EntityStore<Customer>>,
    /// Entity views.
    pub entity_views: Arc<dyn EntityStore<EntityView>>,
    /// Edges.
    pub edges: Arc<dyn EntityStore<Edge>>,
    /// User credentials.
    pub user_credentials: Arc<dyn CredentialsStore<UserCredentials>>,
    /// Device credentials.
    pub device_credentials: Arc<dyn CredentialsStore<DeviceCredentials>>,
    /// Relations.
    pub relations: Arc<dyn RelationStore>,
    /// Attributes.
    pub attributes: Arc<dyn AttributeStore>,
    /// Cluster notifications.
    pub notifier: Arc<dyn ClusterNotifier>,
    /// OTA state recalculation.
    pub ota_state: Arc<dyn OtaStateRecalculator>,
}

impl Collaborators {
    /// Returns true if `entity` exists locally.
    ///
    /// Only kinds that can be relation endpoints are looked up; every other
    /// kind is reported absent.
    pub async fn entity_exists(&self, tenant_id: TenantId, entity: EntityRef) -> StoreResult<bool> {
        match entity.entity_type {
            EntityType::Device => self.devices.exists(tenant_id, entity.id).await,
            EntityType::Asset => self.assets.exists(tenant_id, entity.id).await,
            EntityType::EntityView => self.entity_views.exists(tenant_id, entity.id).await,
            EntityType::Customer => self.customers.exists(tenant_id, entity.id).await,
            EntityType::User => self.users.exists(tenant_id, entity.id).await,
            EntityType::Dashboard => self.dashboards.exists(tenant_id, entity.id).await,
            EntityType::Edge => self.edges.exists(tenant_id, entity.id).await,
            EntityType::Tenant | EntityType::DeviceProfile | EntityType::Alarm => Ok(false),
        }
    }

    /// Resolves an alarm originator by type and name.
    pub async fn find_originator(
        &self,
        tenant_id: TenantId,
        entity_type: EntityType,
        name: &str,
    ) -> StoreResult<Option<EntityRef>> {
        let id = match entity_type {
            EntityType::Device => self
                .devices
                .find_by_name(tenant_id, name)
                .await?
                .map(|d| d.id()),
            EntityType::Asset => self
                .assets
                .find_by_name(tenant_id, name)
                .await?
                .map(|a| a.id()),
            EntityType::EntityView => self
                .entity_views
                .find_by_name(tenant_id, name)
                .await?
                .map(|v| v.id()),
            _ => None,
        };
        Ok(id.map(|id| EntityRef::new(entity_type, id)))
    }

    /// Returns the name of an alarm originator.
    pub async fn originator_name(
        &self,
        tenant_id: TenantId,
        originator: EntityRef,
    ) -> StoreResult<Option<String>> {
        Ok(match originator.entity_type {
            EntityType::Device => self
                .devices
                .find_by_id(tenant_id, originator.id)
                .await?
                .map(|d| d.name),
            EntityType::Asset => self
                .assets
                .find_by_id(tenant_id, originator.id)
                .await?
                .map(|a| a.name),
            EntityType::EntityView => self
                .entity_views
                .find_by_id(tenant_id, originator.id)
                .await?
                .map(|v| v.name),
            _ => None,
        })
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// In-memory collaborators with typed handles for inspection in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollaborators {
    /// Assets.
    pub assets: Arc<MemoryEntityStore<Asset>>,
    /// Alarms.
    pub alarms: Arc<MemoryEntityStore<Alarm>>,
    /// Dashboards.
    pub dashboards: Arc<MemoryEntityStore<Dashboard>>,
    /// Devices.
    pub devices: Arc<MemoryEntityStore<Device>>,
    /// Device profiles.
    pub device_profiles: Arc<MemoryEntityStore<DeviceProfile>>,
    /// Users.
    pub users: Arc<MemoryEntityStore<User>>,
    /// Customers.
    pub customers: Arc<MemoryEntityStore<Customer>>,
    /// Entity views.
    pub entity_views: Arc<MemoryEntityStore<EntityView>>,
    /// Edges.
    pub edges: Arc<MemoryEntityStore<Edge>>,
    /// User credentials.
    pub user_credentials: Arc<MemoryCredentialsStore<UserCredentials>>,
    /// Device credentials.
    pub device_credentials: Arc<MemoryCredentialsStore<DeviceCredentials>>,
    /// Relations.
    pub relations: Arc<MemoryRelationStore>,
    /// Attributes.
    pub attributes: Arc<MemoryAttributeStore>,
    /// Cluster notifications.
    pub notifier: Arc<RecordingClusterNotifier>,
    /// OTA state recalculation.
    pub ota_state: Arc<RecordingOtaStateRecalculator>,
}

impl InMemoryCollaborators {
    /// Creates empty collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the trait-object view used by the engine.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            assets: self.assets.clone(),
            alarms: self.alarms.clone(),
            dashboards: self.dashboards.clone(),
            devices: self.devices.clone(),
            device_profiles: self.device_profiles.clone(),
            users: self.users.clone(),
            customers: self.customers.clone(),
            entity_views: self.entity_views.clone(),
            edges: self.edges.clone(),
            user_credentials: self.user_credentials.clone(),
            device_credentials: self.device_credentials.clone(),
            relations: self.relations.clone(),
            attributes: self.attributes.clone(),
            notifier: self.notifier.clone(),
            ota_state: self.ota_state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgesync_core::EntityId;

    #[tokio::test]
    async fn existence_dispatches_by_type() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let tenant = TenantId::new();
        let mut device = Device::new(tenant, EntityId::new());
        device.name = "Sensor".into();
        memory.devices.insert(device.clone());

        let as_device = EntityRef::new(EntityType::Device, device.id);
        let as_asset = EntityRef::new(EntityType::Asset, device.id);
        let as_profile = EntityRef::new(EntityType::DeviceProfile, device.id);
        assert!(collaborators.entity_exists(tenant, as_device).await.unwrap());
        assert!(!collaborators.entity_exists(tenant, as_asset).await.unwrap());
        assert!(!collaborators.entity_exists(tenant, as_profile).await.unwrap());
    }

    #[tokio::test]
    async fn edge_is_a_known_endpoint() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let tenant = TenantId::new();
        let edge = Edge::new(tenant, EntityId::new(), "Plant edge", "rk-1");
        memory.edges.insert(edge.clone());

        let present = EntityRef::new(EntityType::Edge, edge.id);
        let absent = EntityRef::new(EntityType::Edge, EntityId::new());
        assert!(collaborators.entity_exists(tenant, present).await.unwrap());
        assert!(!collaborators.entity_exists(tenant, absent).await.unwrap());
    }

    #[tokio::test]
    async fn originator_lookup_by_name() {
        let memory = InMemoryCollaborators::new();
        let collaborators = memory.collaborators();
        let tenant = TenantId::new();
        let mut asset = Asset::new(tenant, EntityId::new());
        asset.name = "Tank".into();
        memory.assets.insert(asset.clone());

        let found = collaborators
            .find_originator(tenant, EntityType::Asset, "Tank")
            .await
            .unwrap();
        assert_eq!(found, Some(EntityRef::new(EntityType::Asset, asset.id)));
        assert!(collaborators
            .find_originator(tenant, EntityType::Device, "Tank")
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            collaborators
                .originator_name(tenant, EntityRef::new(EntityType::Asset, asset.id))
                .await
                .unwrap()
                .as_deref(),
            Some("Tank")
        );
    }
}
