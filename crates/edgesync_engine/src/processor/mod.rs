//! Entity-type processors.
//!
//! Each processor owns both directions for one kind: applying inbound
//! update messages to local storage and building outbound messages from
//! sync events.

mod alarm;
mod asset;
mod dashboard;
mod device;
mod device_profile;
mod relation;
mod user;

pub use alarm::AlarmProcessor;
pub use asset::AssetProcessor;
pub use dashboard::DashboardProcessor;
pub use device::DeviceProcessor;
pub use device_profile::DeviceProfileProcessor;
pub use relation::RelationProcessor;
pub use user::UserProcessor;

use crate::collaborators::Collaborators;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::event::{SyncEvent, SyncEventAction, SyncEventType};
use crate::event_log::SyncEventLog;
use crate::identity::IdentityStrategy;
use crate::locks::CreationLocks;
use crate::outcome::ApplyOutcome;
use async_trait::async_trait;
use edgesync_core::{now_millis, EntityId, EntityRef, EntityType, StoreResult, TenantId};
use edgesync_protocol::{SyncMessage, UpdateMsgType};
use rand::distributions::{Alphanumeric, DistString};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use tracing::trace;

/// Everything a processor needs besides the message itself.
#[derive(Debug, Clone)]
pub struct ProcessorContext {
    /// Storage and side-effect collaborators.
    pub collaborators: Collaborators,
    /// Creation lock registry.
    pub locks: Arc<CreationLocks>,
    /// Outbound event log.
    pub event_log: SyncEventLog,
    /// Engine configuration.
    pub config: SyncConfig,
}

impl ProcessorContext {
    /// Queues a follow-up event.
    pub async fn enqueue(
        &self,
        tenant_id: TenantId,
        entity_type: SyncEventType,
        action: SyncEventAction,
        entity_id: EntityId,
        body: Option<Value>,
    ) -> SyncResult<()> {
        self.event_log
            .enqueue(tenant_id, entity_type, action, entity_id, body)
            .await
    }

    /// Asks the peer for the attributes and relations of `entity`, when enabled.
    ///
    /// Both requests carry the same issue time as their creation time.
    pub async fn request_additional_data(
        &self,
        tenant_id: TenantId,
        entity_type: SyncEventType,
        entity_id: EntityId,
    ) -> SyncResult<()> {
        if !self.config.request_additional_data {
            return Ok(());
        }
        let issued = now_millis();
        trace!(
            tenant = %tenant_id,
            %entity_type,
            %entity_id,
            issued,
            "requesting attributes and relations"
        );
        for action in [SyncEventAction::AttributesRequest, SyncEventAction::RelationRequest] {
            self.event_log
                .append(
                    SyncEvent::new(tenant_id, entity_type, action, entity_id, None)
                        .with_created_time(issued),
                )
                .await?;
        }
        Ok(())
    }
}

/// Inbound and outbound handling of one entity kind.
#[async_trait]
pub trait EntityProcessor: Send + Sync {
    /// Inbound message type.
    type Msg: Debug + Send + Sync + 'static;

    /// Entity kind handled.
    const KIND: EntityType;

    /// Identity resolution used for inbound messages.
    fn identity(&self) -> IdentityStrategy {
        IdentityStrategy::for_kind(Self::KIND)
    }

    /// Applies a message received from the peer.
    async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: Self::Msg,
    ) -> SyncResult<ApplyOutcome>;

    /// Builds the message for `event`, or `None` if the entity is gone.
    async fn construct_outbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        event: &SyncEvent,
        msg_type: UpdateMsgType,
    ) -> SyncResult<Option<SyncMessage>>;
}

/// Attaches message context to collaborator failures.
pub(crate) trait StoreResultExt<T> {
    /// Converts a store failure into a [`SyncError`] carrying `context`.
    fn context<C: Debug + ?Sized>(self, context: &C) -> SyncResult<T>;
}

impl<T> StoreResultExt<T> for StoreResult<T> {
    fn context<C: Debug + ?Sized>(self, context: &C) -> SyncResult<T> {
        self.map_err(|e| SyncError::from_store(format!("{context:?}"), e))
    }
}

/// Joins optional ID halves; both must be present.
pub(crate) fn optional_id(msb: Option<u64>, lsb: Option<u64>) -> Option<EntityId> {
    match (msb, lsb) {
        (Some(msb), Some(lsb)) => Some(EntityId::from_halves(msb, lsb)),
        _ => None,
    }
}

/// Parses optional embedded JSON text.
pub(crate) fn parse_json<C: Debug + ?Sized>(
    raw: Option<&str>,
    context: &C,
) -> SyncResult<Option<Value>> {
    raw.map(|text| serde_json::from_str(text))
        .transpose()
        .map_err(|e| SyncError::decode(format!("{context:?}"), e))
}

/// Parses a wire enum string.
pub(crate) fn parse_enum<T, C>(raw: &str, context: &C) -> SyncResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    C: Debug + ?Sized,
{
    raw.parse()
        .map_err(|e: T::Err| SyncError::decode(format!("{context:?}"), e))
}

/// Decodes the entity snapshot carried by an event.
pub(crate) fn decode_snapshot<T: DeserializeOwned>(event: &SyncEvent) -> SyncResult<Option<T>> {
    event
        .entity_body
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| SyncError::decode(format!("{event:?}"), e))
}

/// Serializes an entity snapshot for an event body.
pub(crate) fn snapshot<T: serde::Serialize + Debug>(entity: &T) -> SyncResult<Value> {
    serde_json::to_value(entity).map_err(|e| SyncError::decode(format!("{entity:?}"), e))
}

/// Rejects message types a kind cannot handle.
pub(crate) fn unsupported(kind: EntityType, msg_type: UpdateMsgType) -> SyncError {
    SyncError::unsupported(kind.as_str(), msg_type)
}

/// Random alphanumeric token.
pub(crate) fn random_token(length: usize) -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), length)
}

/// Random ASCII letters.
pub(crate) fn random_letters(length: usize) -> String {
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(LETTERS[rng.gen_range(0..LETTERS.len())]))
        .collect()
}

/// Reference used in skip outcomes.
pub(crate) fn entity_ref(kind: EntityType, id: EntityId) -> EntityRef {
    EntityRef::new(kind, id)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_id_needs_both_halves() {
        assert!(optional_id(Some(1), None).is_none());
        assert!(optional_id(None, Some(1)).is_none());
        assert_eq!(optional_id(Some(0), Some(5)), Some(EntityId::from_halves(0, 5)));
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let err = parse_json(Some("{oops"), "AssetUpdateMsg").unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
        assert!(parse_json(None, "AssetUpdateMsg").unwrap().is_none());
    }

    #[test]
    fn random_strings_have_requested_shape() {
        let token = random_token(30);
        assert_eq!(token.len(), 30);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        let letters = random_letters(15);
        assert_eq!(letters.len(), 15);
        assert!(letters.chars().all(|c| c.is_ascii_alphabetic()));
    }
}
