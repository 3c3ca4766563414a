//! How inbound messages find their local record.

use edgesync_core::EntityType;

/// Identity resolution strategy of an entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// The message ID is the local ID.
    ById,
    /// Edge and cloud assign different IDs; match on a natural key.
    ByNaturalKey,
}

impl IdentityStrategy {
    /// Returns the strategy for `kind`.
    pub fn for_kind(kind: EntityType) -> Self {
        match kind {
            // (originator, alarm type)
            EntityType::Alarm => IdentityStrategy::ByNaturalKey,
            EntityType::Tenant
            | EntityType::Customer
            | EntityType::User
            | EntityType::Dashboard
            | EntityType::Asset
            | EntityType::Device
            | EntityType::DeviceProfile
            | EntityType::EntityView
            | EntityType::Edge => IdentityStrategy::ById,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_alarms_use_natural_keys() {
        assert_eq!(
            IdentityStrategy::for_kind(EntityType::Alarm),
            IdentityStrategy::ByNaturalKey
        );
        assert_eq!(
            IdentityStrategy::for_kind(EntityType::Asset),
            IdentityStrategy::ById
        );
        assert_eq!(
            IdentityStrategy::for_kind(EntityType::DeviceProfile),
            IdentityStrategy::ById
        );
    }
}
