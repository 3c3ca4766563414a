//! Edge pairing registry.

use crate::error::{SyncError, SyncResult};
use edgesync_core::{AttributeKv, AttributeScope, AttributeStore, EntityRef, KvValue, TenantId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Attribute key under which the pairing identity is stored.
pub const EDGE_SETTINGS_KEY: &str = "edgeSettings";

/// Routing identity an edge uses to connect to the cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingIdentity {
    /// Routing key.
    pub routing_key: String,
    /// Shared secret.
    pub secret: String,
    /// Edge name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Edge type.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    /// Cloud flavour the edge is paired with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_type: Option<String>,
}

impl PairingIdentity {
    /// Creates an identity with only routing key and secret.
    pub fn new(routing_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            routing_key: routing_key.into(),
            secret: secret.into(),
            name: None,
            edge_type: None,
            cloud_type: None,
        }
    }
}

/// Reads and writes the per-tenant pairing identity.
///
/// The identity is a JSON document stored as a server-scope attribute of
/// the tenant entity.
#[derive(Clone)]
pub struct EdgePairingRegistry {
    attributes: Arc<dyn AttributeStore>,
}

impl EdgePairingRegistry {
    /// Creates a registry over an attribute store.
    pub fn new(attributes: Arc<dyn AttributeStore>) -> Self {
        Self { attributes }
    }

    /// Returns the tenant's identity, or `None` if the edge was never paired.
    pub async fn get(&self, tenant_id: TenantId) -> SyncResult<Option<PairingIdentity>> {
        let context = || format!("{EDGE_SETTINGS_KEY} of tenant {tenant_id}");
        let stored = self
            .attributes
            .get(
                tenant_id,
                EntityRef::tenant(tenant_id),
                AttributeScope::ServerScope,
                EDGE_SETTINGS_KEY,
            )
            .await
            .map_err(|e| SyncError::from_store(context(), e))?;
        let Some(attribute) = stored else {
            debug!(tenant = %tenant_id, "no pairing identity stored");
            return Ok(None);
        };

        let json = match attribute.value.to_json() {
            Some(parsed) => parsed.map_err(|e| SyncError::decode(context(), e))?,
            None => {
                return Err(SyncError::decode(
                    context(),
                    "edge settings are not a JSON value",
                ))
            }
        };
        serde_json::from_value(json)
            .map(Some)
            .map_err(|e| SyncError::decode(context(), e))
    }

    /// Stores the tenant's identity, replacing any previous one.
    pub async fn put(&self, tenant_id: TenantId, identity: &PairingIdentity) -> SyncResult<()> {
        let context = || format!("{EDGE_SETTINGS_KEY} of tenant {tenant_id}");
        let json = serde_json::to_string(identity).map_err(|e| SyncError::decode(context(), e))?;
        self.attributes
            .save(
                tenant_id,
                EntityRef::tenant(tenant_id),
                AttributeScope::ServerScope,
                vec![AttributeKv::new(EDGE_SETTINGS_KEY, KvValue::String(json))],
            )
            .await
            .map_err(|e| SyncError::from_store(context(), e))
    }
}

impl std::fmt::Debug for EdgePairingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgePairingRegistry").finish_non_exhaustive()
    }
}
