//! Repository for the `users` table.

use sqlx::PgPool;
use capa_core::types::{DbId, Timestamp};

use crate::models::user::{CreateUser, User, UserWithRole};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, password_hash, role_id, is_active, \
                        failed_login_count, locked_until, last_failed_login_at, \
                        last_login_at, password_changed_at, created_at, updated_at";

/// `COLUMNS` qualified with the `u` alias, plus the joined role name.
const COLUMNS_WITH_ROLE: &str = "u.id, u.name, u.email, u.password_hash, u.role_id, u.is_active, \
                                  u.failed_login_count, u.locked_until, u.last_failed_login_at, \
                                  u.last_login_at, u.password_changed_at, u.created_at, u.updated_at, \
                                  r.name AS role";

/// Provides the credential-store operations on users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row. The email is lower-cased.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.name)
            .bind(input.email.to_lowercase())
            .bind(&input.password_hash)
            .bind(input.role_id)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user and its role name by email, case-insensitively.
    pub async fn find_with_role_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<UserWithRole>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS_WITH_ROLE} FROM users u
             JOIN roles r ON r.id = u.role_id
             WHERE lower(u.email) = lower($1)"
        );
        sqlx::query_as::<_, UserWithRole>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Find a user and its role name by internal ID.
    pub async fn find_with_role_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<UserWithRole>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS_WITH_ROLE} FROM users u
             JOIN roles r ON r.id = u.role_id
             WHERE u.id = $1"
        );
        sqlx::query_as::<_, UserWithRole>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Increment the failed login counter and stamp the failure time.
    ///
    /// Returns the new count, or `None` if the user does not exist. The
    /// increment happens in SQL so concurrent failures are not lost to a
    /// read-modify-write race.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE users SET
                failed_login_count = failed_login_count + 1,
                last_failed_login_at = $2
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(pool)
        .await
    }

    /// Lock a user account until the specified timestamp.
    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Clear an expired lock and its failure counter.
    pub async fn clear_lock(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = NULL, failed_login_count = 0 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Record a successful login: reset the failure counter, clear
    /// `locked_until` and `last_failed_login_at`, and set `last_login_at`.
    pub async fn record_successful_login(
        pool: &PgPool,
        id: DbId,
        at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_failed_login_at = NULL,
                last_login_at = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Replace a user's password hash, stamp `password_changed_at`, and reset
    /// lockout state. Returns `true` if the row was updated.
    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
        changed_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET
                password_hash = $2,
                password_changed_at = $3,
                failed_login_count = 0,
                locked_until = NULL,
                last_failed_login_at = NULL
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(changed_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-deactivate a user by setting `is_active = false`.
    ///
    /// Returns `true` if the user exists, whether or not it was already inactive.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET is_active = false WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
