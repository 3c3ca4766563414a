//! Creation lock registry.
//!
//! Find-or-create sequences of one entity kind are serialized so two
//! concurrent messages for the same new entity cannot both create it.

use crate::config::LockScope;
use edgesync_core::{EntityType, TenantId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

type LockKey = (EntityType, Option<TenantId>);

/// Registry of per-kind async mutexes.
#[derive(Debug, Default)]
pub struct CreationLocks {
    scope: LockScope,
    locks: Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>,
}

/// Held while a find-or-create section runs. Releases the lock on drop.
#[derive(Debug)]
pub struct CreationGuard {
    kind: EntityType,
    _guard: OwnedMutexGuard<()>,
}

impl CreationGuard {
    /// Entity kind the guard serializes.
    pub fn kind(&self) -> EntityType {
        self.kind
    }
}

impl Drop for CreationGuard {
    fn drop(&mut self) {
        trace!(kind = %self.kind, "creation lock released");
    }
}

impl CreationLocks {
    /// Creates an empty registry.
    pub fn new(scope: LockScope) -> Self {
        Self {
            scope,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the configured scope.
    pub fn scope(&self) -> LockScope {
        self.scope
    }

    /// Waits for the creation lock of `kind` (and `tenant_id` when scoped per tenant).
    pub async fn acquire(&self, kind: EntityType, tenant_id: TenantId) -> CreationGuard {
        let key = match self.scope {
            LockScope::PerKind => (kind, None),
            LockScope::PerTenantKind => (kind, Some(tenant_id)),
        };
        let lock = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(key).or_default())
        };
        let guard = lock.lock_owned().await;
        trace!(kind = %kind, "creation lock acquired");
        CreationGuard {
            kind,
            _guard: guard,
        }
    }

    /// Returns the number of distinct locks created so far.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Returns true if no lock has been created yet.
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_kind_is_serialized() {
        let locks = Arc::new(CreationLocks::new(LockScope::PerKind));
        let guard = locks.acquire(EntityType::Asset, TenantId::new()).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(EntityType::Asset, TenantId::new()).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_kinds_do_not_block() {
        let locks = CreationLocks::new(LockScope::PerKind);
        let tenant = TenantId::new();
        let _asset = locks.acquire(EntityType::Asset, tenant).await;
        let device = tokio::time::timeout(
            Duration::from_secs(1),
            locks.acquire(EntityType::Device, tenant),
        )
        .await;
        assert!(device.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn per_tenant_scope_separates_tenants() {
        let locks = CreationLocks::new(LockScope::PerTenantKind);
        let _first = locks.acquire(EntityType::Asset, TenantId::new()).await;
        let second = tokio::time::timeout(
            Duration::from_secs(1),
            locks.acquire(EntityType::Asset, TenantId::new()),
        )
        .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn guard_reports_kind() {
        let locks = CreationLocks::default();
        let guard = locks.acquire(EntityType::DeviceProfile, TenantId::new()).await;
        assert_eq!(guard.kind(), EntityType::DeviceProfile);
    }
}
