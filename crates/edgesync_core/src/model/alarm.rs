use super::Entity;
use crate::entity_type::{EntityRef, EntityType};
use crate::id::{now_millis, EntityId, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    /// Alarm severity.
    pub enum AlarmSeverity ("severity") {
        /// Critical.
        Critical => "CRITICAL",
        /// Major.
        Major => "MAJOR",
        /// Minor.
        Minor => "MINOR",
        /// Warning.
        Warning => "WARNING",
        /// Indeterminate.
        Indeterminate => "INDETERMINATE",
    }
}

wire_enum! {
    /// Alarm lifecycle status.
    pub enum AlarmStatus ("status") {
        /// Active, not acknowledged.
        ActiveUnack => "ACTIVE_UNACK",
        /// Active, acknowledged.
        ActiveAck => "ACTIVE_ACK",
        /// Cleared, not acknowledged.
        ClearedUnack => "CLEARED_UNACK",
        /// Cleared, acknowledged.
        ClearedAck => "CLEARED_ACK",
    }
}

impl AlarmStatus {
    /// Returns true if the alarm has been cleared.
    pub fn is_cleared(self) -> bool {
        matches!(self, Self::ClearedUnack | Self::ClearedAck)
    }

    /// Returns true if the alarm has been acknowledged.
    pub fn is_acked(self) -> bool {
        matches!(self, Self::ActiveAck | Self::ClearedAck)
    }

    /// Status after acknowledgement.
    pub fn acked(self) -> Self {
        if self.is_cleared() {
            Self::ClearedAck
        } else {
            Self::ActiveAck
        }
    }

    /// Status after clearing.
    pub fn cleared(self) -> Self {
        if self.is_acked() {
            Self::ClearedAck
        } else {
            Self::ClearedUnack
        }
    }
}

/// An alarm raised against an originator entity.
///
/// Edge and cloud assign their own alarm IDs, so alarms are matched across
/// peers by the natural key (originator, alarm type), not by ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    /// Local alarm ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Alarm type, e.g. "High Temperature".
    #[serde(rename = "type")]
    pub alarm_type: String,
    /// Entity that raised the alarm.
    pub originator: EntityRef,
    /// Severity.
    pub severity: AlarmSeverity,
    /// Status.
    pub status: AlarmStatus,
    /// Start time (unix millis).
    pub start_ts: i64,
    /// End time (unix millis).
    pub end_ts: i64,
    /// Acknowledgement time (unix millis).
    pub ack_ts: i64,
    /// Clear time (unix millis).
    pub clear_ts: i64,
    /// Whether the alarm propagates to related entities.
    pub propagate: bool,
    /// Free-form details.
    pub details: Option<Value>,
}

impl Alarm {
    /// Creates a new active alarm with a fresh local ID.
    pub fn new(
        tenant_id: TenantId,
        originator: EntityRef,
        alarm_type: impl Into<String>,
        severity: AlarmSeverity,
    ) -> Self {
        let id = EntityId::new_time_based();
        let now = now_millis();
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            alarm_type: alarm_type.into(),
            originator,
            severity,
            status: AlarmStatus::ActiveUnack,
            start_ts: now,
            end_ts: now,
            ack_ts: 0,
            clear_ts: 0,
            propagate: false,
            details: None,
        }
    }
}

impl Entity for Alarm {
    const ENTITY_TYPE: EntityType = EntityType::Alarm;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn name(&self) -> &str {
        &self.alarm_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        assert_eq!(AlarmStatus::ActiveUnack.acked(), AlarmStatus::ActiveAck);
        assert_eq!(AlarmStatus::ActiveUnack.cleared(), AlarmStatus::ClearedUnack);
        assert_eq!(AlarmStatus::ActiveAck.cleared(), AlarmStatus::ClearedAck);
        assert_eq!(AlarmStatus::ClearedUnack.acked(), AlarmStatus::ClearedAck);
        assert!(AlarmStatus::ClearedAck.is_cleared());
        assert!(!AlarmStatus::ActiveAck.is_cleared());
    }

    #[test]
    fn wire_names() {
        assert_eq!("MAJOR".parse::<AlarmSeverity>().unwrap(), AlarmSeverity::Major);
        assert_eq!(AlarmStatus::ClearedUnack.as_str(), "CLEARED_UNACK");
        assert!("LOUD".parse::<AlarmSeverity>().is_err());
    }
}
