use super::{Credentials, Entity};
use crate::entity_type::EntityType;
use crate::id::{EntityId, TenantId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

wire_enum! {
    /// Authority level of a user.
    pub enum Authority ("authority") {
        /// System administrator.
        SysAdmin => "SYS_ADMIN",
        /// Tenant administrator.
        TenantAdmin => "TENANT_ADMIN",
        /// Customer user.
        CustomerUser => "CUSTOMER_USER",
    }
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User ID.
    pub id: EntityId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Creation time (unix millis).
    pub created_time: i64,
    /// Login email, unique.
    pub email: String,
    /// Authority.
    pub authority: Authority,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Free-form additional info.
    pub additional_info: Option<Value>,
    /// Customer the user belongs to.
    pub customer_id: Option<EntityId>,
}

impl User {
    /// Creates an empty tenant-admin user with the creation time derived from its ID.
    pub fn new(tenant_id: TenantId, id: EntityId) -> Self {
        Self {
            id,
            tenant_id,
            created_time: id.created_time_or_now(),
            email: String::new(),
            authority: Authority::TenantAdmin,
            first_name: None,
            last_name: None,
            additional_info: None,
            customer_id: None,
        }
    }
}

impl Entity for User {
    const ENTITY_TYPE: EntityType = EntityType::User;

    fn id(&self) -> EntityId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn name(&self) -> &str {
        &self.email
    }
}

/// Login credentials of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredentials {
    /// Owning user.
    pub user_id: EntityId,
    /// Whether the user may log in.
    pub enabled: bool,
    /// Password hash.
    pub password: Option<String>,
    /// Single-use activation token.
    pub activate_token: Option<String>,
    /// Password reset token.
    pub reset_token: Option<String>,
}

impl UserCredentials {
    /// Disabled credentials awaiting activation with the given token.
    pub fn pending_activation(user_id: EntityId, activate_token: String) -> Self {
        Self {
            user_id,
            enabled: false,
            password: None,
            activate_token: Some(activate_token),
            reset_token: None,
        }
    }
}

impl Credentials for UserCredentials {
    fn owner_id(&self) -> EntityId {
        self.user_id
    }
}
