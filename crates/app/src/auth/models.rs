//! Auth data models.

use crate::domain::users::models::{User, UserUuid};

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_uuid: UserUuid,

    /// Identity-provider subject id.
    pub subject: String,

    pub is_admin: bool,
}

impl From<User> for Principal {
    fn from(user: User) -> Self {
        Self {
            user_uuid: user.uuid,
            subject: user.subject,
            is_admin: user.is_admin,
        }
    }
}
