//! Update message types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What an update message asks the receiving peer to do.
///
/// Encoded on the wire as a plain integer. Codes this version does not know
/// decode to [`UpdateMsgType::Unrecognized`] instead of failing, so a newer
/// peer cannot break decoding of a whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum UpdateMsgType {
    /// Entity was created.
    #[default]
    EntityCreated,
    /// Entity was updated.
    EntityUpdated,
    /// Entity was deleted.
    EntityDeleted,
    /// Alarm was acknowledged.
    AlarmAck,
    /// Alarm was cleared.
    AlarmClear,
    /// Unknown code.
    Unrecognized(i32),
}

impl UpdateMsgType {
    /// Converts to the wire code.
    pub fn to_code(&self) -> i32 {
        match self {
            UpdateMsgType::EntityCreated => 0,
            UpdateMsgType::EntityUpdated => 1,
            UpdateMsgType::EntityDeleted => 2,
            UpdateMsgType::AlarmAck => 3,
            UpdateMsgType::AlarmClear => 4,
            UpdateMsgType::Unrecognized(code) => *code,
        }
    }

    /// Converts from a wire code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => UpdateMsgType::EntityCreated,
            1 => UpdateMsgType::EntityUpdated,
            2 => UpdateMsgType::EntityDeleted,
            3 => UpdateMsgType::AlarmAck,
            4 => UpdateMsgType::AlarmClear,
            other => UpdateMsgType::Unrecognized(other),
        }
    }

    /// Returns true for create and update messages.
    pub fn is_upsert(&self) -> bool {
        matches!(
            self,
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated
        )
    }
}

impl From<i32> for UpdateMsgType {
    fn from(code: i32) -> Self {
        Self::from_code(code)
    }
}

impl From<UpdateMsgType> for i32 {
    fn from(msg_type: UpdateMsgType) -> Self {
        msg_type.to_code()
    }
}

impl fmt::Display for UpdateMsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMsgType::EntityCreated => f.write_str("ENTITY_CREATED"),
            UpdateMsgType::EntityUpdated => f.write_str("ENTITY_UPDATED"),
            UpdateMsgType::EntityDeleted => f.write_str("ENTITY_DELETED"),
            UpdateMsgType::AlarmAck => f.write_str("ALARM_ACK"),
            UpdateMsgType::AlarmClear => f.write_str("ALARM_CLEAR"),
            UpdateMsgType::Unrecognized(code) => write!(f, "UNRECOGNIZED({code})"),
        }
    }
}
