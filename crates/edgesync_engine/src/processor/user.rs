//! User processor: users and their credentials.

use super::{
    decode_snapshot, entity_ref, optional_id, parse_enum, parse_json, random_token, unsupported,
    EntityProcessor, ProcessorContext, StoreResultExt,
};
use crate::constructors::{user_credentials_update_msg, user_delete_msg, user_update_msg};
use crate::error::SyncResult;
use crate::event::{SyncEvent, SyncEventAction, SyncEventType};
use crate::outcome::{ApplyOutcome, SkipReason};
use async_trait::async_trait;
use edgesync_core::{EntityId, EntityType, TenantId, User, UserCredentials};
use edgesync_protocol::{SyncMessage, UpdateMsgType, UserCredentialsUpdateMsg, UserUpdateMsg};
use tracing::{debug, warn};

/// Synchronizes users and their credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserProcessor;

impl UserProcessor {
    /// Replaces the login credentials of an existing user.
    ///
    /// Credentials for an unknown user are skipped. Missing credentials of a
    /// known user are created. Activation and reset tokens are cleared since
    /// the peer's password is now authoritative.
    pub async fn apply_credentials(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: UserCredentialsUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let user_id = EntityId::from_halves(msg.user_id_msb, msg.user_id_lsb);
        // Keeps the password out of error messages.
        let context = format!("user credentials of {user_id}");
        let user_exists = ctx
            .collaborators
            .users
            .exists(tenant_id, user_id)
            .await
            .context(context.as_str())?;
        if !user_exists {
            warn!(tenant = %tenant_id, user = %user_id, "credentials for unknown user ignored");
            return Ok(ApplyOutcome::Skipped(SkipReason::ReferenceMissing(
                entity_ref(EntityType::User, user_id),
            )));
        }

        let store = &ctx.collaborators.user_credentials;
        let existing = store
            .find_by_owner(tenant_id, user_id)
            .await
            .context(context.as_str())?;
        let created = existing.is_none();
        let mut credentials = existing.unwrap_or(UserCredentials {
            user_id,
            enabled: false,
            password: None,
            activate_token: None,
            reset_token: None,
        });
        credentials.enabled = msg.enabled;
        credentials.password = msg.password;
        credentials.activate_token = None;
        credentials.reset_token = None;
        store
            .save(tenant_id, credentials)
            .await
            .context(context.as_str())?;
        debug!(tenant = %tenant_id, user = %user_id, created, "user credentials applied");
        Ok(ApplyOutcome::upserted(created))
    }

    /// Builds the credentials message for a `CREDENTIALS_UPDATED` event.
    pub async fn construct_credentials(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        event: &SyncEvent,
    ) -> SyncResult<Option<SyncMessage>> {
        let credentials = ctx
            .collaborators
            .user_credentials
            .find_by_owner(tenant_id, event.entity_id)
            .await
            .context(event)?;
        Ok(credentials
            .as_ref()
            .map(user_credentials_update_msg)
            .map(SyncMessage::UserCredentials))
    }
}

#[async_trait]
impl EntityProcessor for UserProcessor {
    type Msg = UserUpdateMsg;
    const KIND: EntityType = EntityType::User;

    async fn apply_inbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        msg: UserUpdateMsg,
    ) -> SyncResult<ApplyOutcome> {
        let id = EntityId::from_halves(msg.id_msb, msg.id_lsb);
        let store = &ctx.collaborators.users;
        match msg.msg_type {
            UpdateMsgType::EntityCreated | UpdateMsgType::EntityUpdated => {
                let created = {
                    let _guard = ctx.locks.acquire(Self::KIND, tenant_id).await;
                    let existing = store.find_by_id(tenant_id, id).await.context(&msg)?;
                    let created = existing.is_none();
                    let mut user = existing.unwrap_or_else(|| User::new(tenant_id, id));

                    if let Some(email) = &msg.email {
                        user.email = email.clone();
                    }
                    if let Some(authority) = msg.authority.as_deref() {
                        user.authority = parse_enum(authority, &msg)?;
                    }
                    user.first_name = msg.first_name.clone();
                    user.last_name = msg.last_name.clone();
                    user.additional_info = parse_json(msg.additional_info.as_deref(), &msg)?;
                    user.customer_id = optional_id(msg.customer_id_msb, msg.customer_id_lsb);

                    store.save(user).await.context(&msg)?;
                    if created {
                        let token = random_token(ctx.config.activation_token_length);
                        ctx.collaborators
                            .user_credentials
                            .save(tenant_id, UserCredentials::pending_activation(id, token))
                            .await
                            .context(&msg)?;
                    }
                    created
                };
                debug!(tenant = %tenant_id, user = %id, created, "user applied");
                if created {
                    ctx.enqueue(
                        tenant_id,
                        SyncEventType::User,
                        SyncEventAction::CredentialsRequest,
                        id,
                        None,
                    )
                    .await?;
                }
                ctx.request_additional_data(tenant_id, SyncEventType::User, id)
                    .await?;
                Ok(ApplyOutcome::upserted(created))
            }
            UpdateMsgType::EntityDeleted => {
                let existed = store.delete(tenant_id, id).await.context(&msg)?;
                Ok(ApplyOutcome::deleted(existed))
            }
            other @ (UpdateMsgType::AlarmAck
            | UpdateMsgType::AlarmClear
            | UpdateMsgType::Unrecognized(_)) => Err(unsupported(Self::KIND, other)),
        }
    }

    async fn construct_outbound(
        &self,
        ctx: &ProcessorContext,
        tenant_id: TenantId,
        event: &SyncEvent,
        msg_type: UpdateMsgType,
    ) -> SyncResult<Option<SyncMessage>> {
        let msg = match msg_type {
            UpdateMsgType::EntityDeleted => match decode_snapshot::<User>(event)? {
                Some(user) => user_update_msg(msg_type, &user, None),
                None => user_delete_msg(event.entity_id),
            },
            _ => {
                let found = ctx
                    .collaborators
                    .users
                    .find_by_id(tenant_id, event.entity_id)
                    .await
                    .context(event)?;
                match found {
                    Some(user) => user_update_msg(msg_type, &user, None),
                    None => return Ok(None),
                }
            }
        };
        Ok(Some(SyncMessage::User(msg)))
    }
}
