//! Auth service.

use async_trait::async_trait;
use mockall::automock;
use tracing::debug;

use crate::{
    auth::{AuthServiceError, IdentityClient, Principal},
    database::Db,
    domain::users::repository::PgUsersRepository,
};

#[derive(Debug, Clone)]
pub struct PgAuthService {
    db: Db,
    users: PgUsersRepository,
    identity: IdentityClient,
}

impl PgAuthService {
    #[must_use]
    pub fn new(db: Db, identity: IdentityClient) -> Self {
        Self {
            db,
            users: PgUsersRepository::new(),
            identity,
        }
    }
}

#[async_trait]
impl AuthService for PgAuthService {
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError> {
        let claims = self
            .identity
            .userinfo(bearer_token)
            .await?
            .ok_or(AuthServiceError::NotFound)?;

        let mut tx = self.db.begin().await?;

        let user = self
            .users
            .find_user_by_subject(&mut tx, &claims.subject)
            .await?;

        tx.commit().await?;

        user.map(Principal::from).ok_or_else(|| {
            debug!(subject = %claims.subject, "authenticated subject has no mirrored user");

            AuthServiceError::NotFound
        })
    }
}

#[automock]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Resolve a bearer token to the mirrored user it belongs to.
    async fn authenticate_bearer(&self, bearer_token: &str) -> Result<Principal, AuthServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        auth::identity::tests::{client, serve_once},
        test::{TestContext, helpers::create_user},
    };

    use super::*;

    #[tokio::test]
    async fn authenticate_bearer_resolves_mirrored_user() -> TestResult {
        let ctx = TestContext::new().await;
        let user = create_user(&ctx, "user_1").await?;

        let (url, _request) = serve_once("200 OK", r#"{"sub":"user_1"}"#).await?;
        let auth = PgAuthService::new(Db::new(ctx.db.pool().clone()), client(url));

        let principal = auth.authenticate_bearer("token").await?;

        assert_eq!(principal.user_uuid, user.uuid);
        assert_eq!(principal.subject, "user_1");
        assert!(!principal.is_admin);

        Ok(())
    }

    #[tokio::test]
    async fn authenticate_bearer_unknown_subject_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let (url, _request) = serve_once("200 OK", r#"{"sub":"stranger"}"#).await?;
        let auth = PgAuthService::new(Db::new(ctx.db.pool().clone()), client(url));

        let result = auth.authenticate_bearer("token").await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn authenticate_bearer_rejected_token_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let (url, _request) = serve_once("401 Unauthorized", "{}").await?;
        let auth = PgAuthService::new(Db::new(ctx.db.pool().clone()), client(url));

        let result = auth.authenticate_bearer("token").await;

        assert!(
            matches!(result, Err(AuthServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }
}
