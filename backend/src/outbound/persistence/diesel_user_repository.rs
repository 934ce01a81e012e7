//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{
    EmailAddress, HashedPassword, PersonName, RefreshTokenFingerprint, User, UserAccount, UserId,
    UserRole,
};

use super::diesel_error_mapping::{
    map_basic_diesel_error, pool_error_message, violated_unique_constraint,
};
use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match violated_unique_constraint(&error) {
        Some(EMAIL_CONSTRAINT) => UserPersistenceError::duplicate_email(),
        _ => map_basic_diesel_error(
            error,
            UserPersistenceError::query,
            UserPersistenceError::connection,
        ),
    }
}

fn row_to_account(row: UserRow) -> Result<UserAccount, UserPersistenceError> {
    let email = EmailAddress::new(&row.email)
        .map_err(|err| UserPersistenceError::query(format!("stored email invalid: {err}")))?;
    let role = row
        .role
        .parse::<UserRole>()
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;

    Ok(UserAccount {
        user: User {
            id: UserId::from_uuid(row.id),
            email,
            first_name: PersonName::from_trusted(row.first_name),
            last_name: PersonName::from_trusted(row.last_name),
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        },
        password_hash: HashedPassword::new(row.password_hash),
        refresh_token: row.refresh_token_hash.map(RefreshTokenFingerprint::from_stored),
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = &account.user;
        let row = NewUserRow {
            id: *user.id.as_uuid(),
            email: user.email.as_ref(),
            password_hash: account.password_hash.as_str(),
            first_name: user.first_name.as_ref(),
            last_name: user.last_name.as_ref(),
            role: user.role.as_str(),
            refresh_token_hash: account
                .refresh_token
                .as_ref()
                .map(RefreshTokenFingerprint::as_str),
            created_at: user.created_at,
            updated_at: user.updated_at,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_account).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_account).transpose()
    }

    async fn set_refresh_token(
        &self,
        id: &UserId,
        fingerprint: Option<RefreshTokenFingerprint>,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::update(users::table.find(id.as_uuid()))
            .set((
                users::refresh_token_hash.eq(fingerprint.as_ref().map(RefreshTokenFingerprint::as_str)),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use uuid::Uuid;

    fn row(role: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_owned(),
            password_hash: "$argon2id$v=19$stub".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            role: role.to_owned(),
            refresh_token_hash: Some("ab".repeat(32)),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn row_converts_to_account() {
        let account = row_to_account(row("admin")).expect("valid row");

        assert_eq!(account.user.role, UserRole::Admin);
        assert_eq!(
            account.refresh_token.map(|fp| fp.as_str().len()),
            Some(64)
        );
    }

    #[rstest]
    fn unknown_role_is_a_query_error() {
        let error = row_to_account(row("owner")).expect_err("bad role");
        assert!(matches!(error, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let error = map_pool_error(PoolError::checkout("connection refused"));
        assert!(error.to_string().contains("connection refused"));
    }
}
