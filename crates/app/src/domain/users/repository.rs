//! Users Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::users::models::{NewUser, User};

const UPSERT_USER_SQL: &str = include_str!("sql/upsert_user.sql");
const FIND_USER_BY_SUBJECT_SQL: &str = include_str!("sql/find_user_by_subject.sql");
const SET_USER_ADMIN_SQL: &str = include_str!("sql/set_user_admin.sql");
const DELETE_USER_SQL: &str = include_str!("sql/delete_user.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn upsert_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: &NewUser,
    ) -> Result<User, sqlx::Error> {
        query_as::<Postgres, User>(UPSERT_USER_SQL)
            .bind(&user.subject)
            .bind(&user.email)
            .bind(&user.name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_user_by_subject(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subject: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        query_as::<Postgres, User>(FIND_USER_BY_SUBJECT_SQL)
            .bind(subject)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn set_admin(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subject: &str,
        is_admin: bool,
    ) -> Result<User, sqlx::Error> {
        query_as::<Postgres, User>(SET_USER_ADMIN_SQL)
            .bind(subject)
            .bind(is_admin)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        subject: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_USER_SQL)
            .bind(subject)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            subject: row.try_get("subject")?,
            email: row.try_get("email")?,
            name: row.try_get("name")?,
            is_admin: row.try_get("is_admin")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
