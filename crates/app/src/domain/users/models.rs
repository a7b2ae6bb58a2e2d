//! User Models

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// User UUID
pub type UserUuid = TypedUuid<User>;

/// User Model
///
/// A local mirror of an identity-provider account, keyed by the provider's subject id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub uuid: UserUuid,
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub is_admin: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New User Model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewUser {
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
}
