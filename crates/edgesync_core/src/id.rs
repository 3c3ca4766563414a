//! Entity and tenant identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for a synchronized entity.
///
/// Entity IDs are 128-bit UUIDs that are:
/// - Shared between edge and cloud for the same logical entity
/// - Immutable once assigned
/// - Split into two 64-bit halves on the wire
///
/// Time-based (version 1) IDs embed their creation timestamp, which
/// [`EntityId::created_time`] recovers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// The all-zero identifier.
    pub const NIL: EntityId = EntityId(Uuid::nil());

    /// Creates a new random (version 4) entity ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a new time-based (version 1) entity ID stamped with the current time.
    #[must_use]
    pub fn new_time_based() -> Self {
        Self(Uuid::now_v1(node_id()))
    }

    /// Creates an entity ID from a UUID.
    #[inline]
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Creates an entity ID from raw bytes.
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Joins the most and least significant halves carried on the wire.
    #[must_use]
    pub fn from_halves(msb: u64, lsb: u64) -> Self {
        Self(Uuid::from_u128((u128::from(msb) << 64) | u128::from(lsb)))
    }

    /// Splits the ID into its most and least significant halves.
    #[must_use]
    pub fn halves(&self) -> (u64, u64) {
        let value = self.0.as_u128();
        ((value >> 64) as u64, value as u64)
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn to_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the raw bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Returns true for the all-zero identifier.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Returns the creation time (unix millis) embedded in a time-based ID.
    ///
    /// Returns `None` for random IDs.
    #[must_use]
    pub fn created_time(&self) -> Option<i64> {
        self.0.get_timestamp().map(|ts| {
            let (secs, nanos) = ts.to_unix();
            (secs as i64) * 1000 + i64::from(nanos / 1_000_000)
        })
    }

    /// Returns the embedded creation time, falling back to the current time.
    #[must_use]
    pub fn created_time_or_now(&self) -> i64 {
        self.created_time().unwrap_or_else(now_millis)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the tenant owning an entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a new random tenant ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant ID from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn to_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns the tenant as an entity ID (tenants own tenant-scoped attributes).
    #[must_use]
    pub const fn as_entity_id(&self) -> EntityId {
        EntityId::from_uuid(self.0)
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the current time in unix milliseconds.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Node identifier used for time-based IDs, fixed per process.
fn node_id() -> &'static [u8; 6] {
    static NODE_ID: OnceLock<[u8; 6]> = OnceLock::new();
    NODE_ID.get_or_init(rand::random)
}
