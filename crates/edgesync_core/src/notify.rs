//! Side-effect collaborators invoked after local mutations.

use crate::entity_type::EntityRef;
use crate::error::StoreResult;
use crate::id::TenantId;
use crate::model::DeviceProfile;
use async_trait::async_trait;

wire_enum! {
    /// Lifecycle event broadcast to the cluster.
    pub enum ComponentLifecycleEvent ("lifecycle_event") {
        /// Entity was created.
        Created => "CREATED",
        /// Entity was updated.
        Updated => "UPDATED",
        /// Entity was deleted.
        Deleted => "DELETED",
    }
}

/// Broadcasts entity state changes to the rest of the cluster.
#[async_trait]
pub trait ClusterNotifier: Send + Sync {
    /// Announces a lifecycle change of an entity.
    async fn broadcast_entity_state_change(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        event: ComponentLifecycleEvent,
    ) -> StoreResult<()>;

    /// Invalidates caches holding the profile.
    async fn on_device_profile_change(&self, profile: &DeviceProfile) -> StoreResult<()>;

    /// Drops caches holding the deleted profile.
    async fn on_device_profile_delete(&self, profile: &DeviceProfile) -> StoreResult<()>;
}

/// Recomputes over-the-air update state for devices of a profile.
#[async_trait]
pub trait OtaStateRecalculator: Send + Sync {
    /// Called after a profile save with the firmware/software change flags.
    async fn update(
        &self,
        profile: &DeviceProfile,
        firmware_changed: bool,
        software_changed: bool,
    ) -> StoreResult<()>;
}
