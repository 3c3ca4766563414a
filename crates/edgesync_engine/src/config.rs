//! Configuration for the sync engine.

use std::time::Duration;

/// How creation locks are partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockScope {
    /// One lock per entity kind, shared by every tenant.
    #[default]
    PerKind,
    /// One lock per (tenant, entity kind).
    PerTenantKind,
}

/// Configuration for sync processing.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Age after which sync events are removed whether delivered or not.
    pub event_ttl: Duration,
    /// Page size used when deleting every event of a tenant.
    pub cleanup_page_size: usize,
    /// Page size used by [`SyncEngine::drain`](crate::SyncEngine::drain) callers by default.
    pub drain_page_size: usize,
    /// Creation lock partitioning.
    pub lock_scope: LockScope,
    /// Whether create/update of assets, devices, dashboards and users asks
    /// the peer for the entity's attributes and relations.
    pub request_additional_data: bool,
    /// Length of generated user activation tokens.
    pub activation_token_length: usize,
    /// Length of the random suffix appended to clashing device profile names.
    pub conflict_suffix_length: usize,
}

impl SyncConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            event_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            cleanup_page_size: 100,
            drain_page_size: 100,
            lock_scope: LockScope::PerKind,
            request_additional_data: true,
            activation_token_length: 30,
            conflict_suffix_length: 15,
        }
    }

    /// Sets the event TTL.
    pub fn with_event_ttl(mut self, ttl: Duration) -> Self {
        self.event_ttl = ttl;
        self
    }

    /// Sets the tenant cleanup page size.
    pub fn with_cleanup_page_size(mut self, size: usize) -> Self {
        self.cleanup_page_size = size.max(1);
        self
    }

    /// Sets the default drain page size.
    pub fn with_drain_page_size(mut self, size: usize) -> Self {
        self.drain_page_size = size.max(1);
        self
    }

    /// Sets the creation lock scope.
    pub fn with_lock_scope(mut self, scope: LockScope) -> Self {
        self.lock_scope = scope;
        self
    }

    /// Enables or disables follow-up attribute/relation requests.
    pub fn with_request_additional_data(mut self, enabled: bool) -> Self {
        self.request_additional_data = enabled;
        self
    }

    /// Sets the activation token length.
    pub fn with_activation_token_length(mut self, length: usize) -> Self {
        self.activation_token_length = length;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.cleanup_page_size, 100);
        assert_eq!(config.lock_scope, LockScope::PerKind);
        assert!(config.request_additional_data);
        assert_eq!(config.activation_token_length, 30);
        assert_eq!(config.conflict_suffix_length, 15);
    }

    #[test]
    fn builder() {
        let config = SyncConfig::new()
            .with_event_ttl(Duration::from_secs(60))
            .with_cleanup_page_size(0)
            .with_lock_scope(LockScope::PerTenantKind)
            .with_request_additional_data(false);

        assert_eq!(config.event_ttl, Duration::from_secs(60));
        assert_eq!(config.cleanup_page_size, 1);
        assert_eq!(config.lock_scope, LockScope::PerTenantKind);
        assert!(!config.request_additional_data);
    }
}
