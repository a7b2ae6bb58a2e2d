//! Users service.

use async_trait::async_trait;
use mockall::automock;
use tracing::{debug, info};

use crate::{
    database::Db,
    domain::users::{
        errors::UsersServiceError,
        models::{NewUser, User},
        repository::PgUsersRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    db: Db,
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgUsersRepository::new(),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn upsert_user(&self, user: NewUser) -> Result<User, UsersServiceError> {
        let user = NewUser {
            subject: user.subject.trim().to_string(),
            ..user
        };

        if user.subject.is_empty() {
            return Err(UsersServiceError::EmptySubject);
        }

        let mut tx = self.db.begin().await?;

        let user = self.repository.upsert_user(&mut tx, &user).await?;

        tx.commit().await?;

        debug!(subject = %user.subject, "user mirrored");

        Ok(user)
    }

    async fn delete_user(&self, subject: &str) -> Result<(), UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.delete_user(&mut tx, subject).await?;

        if rows_affected == 0 {
            return Err(UsersServiceError::NotFound);
        }

        tx.commit().await?;

        debug!(%subject, "user deleted");

        Ok(())
    }

    async fn get_user_by_subject(&self, subject: &str) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let user = self.repository.find_user_by_subject(&mut tx, subject).await?;

        tx.commit().await?;

        user.ok_or(UsersServiceError::NotFound)
    }

    async fn set_admin(&self, subject: &str, is_admin: bool) -> Result<User, UsersServiceError> {
        let mut tx = self.db.begin().await?;

        let user = self.repository.set_admin(&mut tx, subject, is_admin).await?;

        tx.commit().await?;

        info!(%subject, is_admin, "user admin flag changed");

        Ok(user)
    }
}

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Creates or refreshes the mirror of an identity-provider account.
    ///
    /// The admin flag of an existing user is preserved.
    async fn upsert_user(&self, user: NewUser) -> Result<User, UsersServiceError>;

    /// Deletes the mirrored account with the given subject.
    async fn delete_user(&self, subject: &str) -> Result<(), UsersServiceError>;

    /// Retrieves the mirrored account with the given subject.
    async fn get_user_by_subject(&self, subject: &str) -> Result<User, UsersServiceError>;

    /// Grants or revokes admin access.
    async fn set_admin(&self, subject: &str, is_admin: bool) -> Result<User, UsersServiceError>;
}
