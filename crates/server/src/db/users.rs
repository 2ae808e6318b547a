//! Database operations for users.

use sqlx::PgPool;

use duka_core::UserId;

use super::RepositoryError;
use crate::models::User;

/// Get a user by id.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get(pool: &PgPool, id: UserId) -> Result<Option<User>, RepositoryError> {
    let user = sqlx::query_as::<_, User>(
        r"
        SELECT id, email, name, created_at
        FROM users
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Check that a user exists.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn exists(pool: &PgPool, id: UserId) -> Result<bool, RepositoryError> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}
