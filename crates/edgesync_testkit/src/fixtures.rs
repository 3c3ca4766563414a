//! Test fixtures and node helpers.
//!
//! Provides an in-memory sync node and builders for the entities most
//! tests start from.

use edgesync_core::{
    Asset, Customer, Dashboard, Device, DeviceProfile, Edge, EntityId, EntityView, TenantId, User,
};
use edgesync_engine::{InMemoryCollaborators, MemorySyncEventDao, SyncConfig, SyncEngine};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Installs a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An engine over in-memory collaborators, with typed access to its stores.
pub struct TestNode {
    /// The engine under test.
    pub engine: SyncEngine,
    /// Typed handles to the collaborators the engine writes to.
    pub memory: InMemoryCollaborators,
    /// The event storage behind the engine's log.
    pub events: Arc<MemorySyncEventDao>,
}

impl TestNode {
    /// Creates a node with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SyncConfig::default())
    }

    /// Creates a node that does not ask for attributes and relations after upserts.
    pub fn quiet() -> Self {
        Self::with_config(SyncConfig::default().with_request_additional_data(false))
    }

    /// Creates a node with `config`.
    pub fn with_config(config: SyncConfig) -> Self {
        init_tracing();
        let memory = InMemoryCollaborators::new();
        let events = Arc::new(MemorySyncEventDao::new());
        let engine = SyncEngine::new(memory.collaborators(), events.clone(), config);
        Self {
            engine,
            memory,
            events,
        }
    }

    /// Returns `(entity type, action)` of the tenant's queued events in log order.
    pub fn queued(&self, tenant_id: TenantId) -> Vec<(String, String)> {
        self.events
            .events(tenant_id)
            .into_iter()
            .map(|e| (e.entity_type.to_string(), e.action))
            .collect()
    }
}

impl Default for TestNode {
    fn default() -> Self {
        Self::new()
    }
}

/// Named entity builders with time-based IDs.
pub mod entities {
    use super::*;

    /// An asset named `name` of type "default".
    pub fn asset(tenant_id: TenantId, name: &str) -> Asset {
        let mut asset = Asset::new(tenant_id, EntityId::new_time_based());
        asset.name = name.to_string();
        asset
    }

    /// A device named `name` using `profile`.
    pub fn device(tenant_id: TenantId, name: &str, profile: Option<EntityId>) -> Device {
        let mut device = Device::new(tenant_id, EntityId::new_time_based());
        device.name = name.to_string();
        device.device_profile_id = profile;
        device
    }

    /// A device profile named `name`.
    pub fn device_profile(tenant_id: TenantId, name: &str) -> DeviceProfile {
        let mut profile = DeviceProfile::new(tenant_id, EntityId::new_time_based());
        profile.name = name.to_string();
        profile
    }

    /// A dashboard titled `title`.
    pub fn dashboard(tenant_id: TenantId, title: &str) -> Dashboard {
        let mut dashboard = Dashboard::new(tenant_id, EntityId::new_time_based());
        dashboard.title = title.to_string();
        dashboard
    }

    /// A tenant admin with `email`.
    pub fn user(tenant_id: TenantId, email: &str) -> User {
        let mut user = User::new(tenant_id, EntityId::new_time_based());
        user.email = email.to_string();
        user
    }

    /// A customer titled `title`.
    pub fn customer(tenant_id: TenantId, title: &str) -> Customer {
        Customer::new(tenant_id, EntityId::new_time_based(), title)
    }

    /// An entity view named `name`.
    pub fn entity_view(tenant_id: TenantId, name: &str) -> EntityView {
        EntityView::new(tenant_id, EntityId::new_time_based(), name)
    }

    /// An edge named `name` with routing key `routing_key`.
    pub fn edge(tenant_id: TenantId, name: &str, routing_key: &str) -> Edge {
        Edge::new(tenant_id, EntityId::new_time_based(), name, routing_key)
    }
}

/// Prepared node states.
pub mod scenarios {
    use super::*;

    /// A node holding `count` assets of one tenant.
    pub fn populated_node(tenant_id: TenantId, count: usize) -> (TestNode, Vec<Asset>) {
        let node = TestNode::quiet();
        let assets: Vec<Asset> = (0..count)
            .map(|i| entities::asset(tenant_id, &format!("asset-{i}")))
            .collect();
        for asset in &assets {
            node.memory.assets.insert(asset.clone());
        }
        (node, assets)
    }
}
