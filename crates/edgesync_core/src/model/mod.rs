//! Synchronized entity model.
//!
//! These are the local-store representations that processors read and
//! write. Each entity type implements [`Entity`] so generic stores can
//! index it by tenant, ID and name.

use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

mod alarm;
mod asset;
mod customer;
mod dashboard;
mod device;
mod device_profile;
mod edge;
mod relation;
mod user;

pub use alarm::{Alarm, AlarmSeverity, AlarmStatus};
pub use asset::Asset;
pub use customer::{Customer, EntityView};
pub use dashboard::Dashboard;
pub use device::{Device, DeviceCredentials, DeviceCredentialsType};
pub use device_profile::{
    DeviceProfile, DeviceProfileProvisionType, DeviceProfileType, DeviceTransportType,
};
pub use edge::Edge;
pub use relation::{EntityRelation, RelationKey, RelationTypeGroup};
pub use user::{Authority, User, UserCredentials};

/// An entity stored in a local [`EntityStore`](crate::store::EntityStore).
pub trait Entity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Type tag of this entity.
    const ENTITY_TYPE: EntityType;

    /// Entity ID.
    fn id(&self) -> EntityId;

    /// Owning tenant.
    fn tenant_id(&self) -> TenantId;

    /// Name used for by-name lookups (title for dashboards, email for users).
    fn name(&self) -> &str;
}

/// Credentials attached to an owning entity (a user or a device).
pub trait Credentials: Clone + Debug + Send + Sync + 'static {
    /// ID of the entity these credentials belong to.
    fn owner_id(&self) -> EntityId;
}
