//! Credential store: user records and the append-only login audit trail.
//!
//! All operations are single-attempt; storage failures surface to the
//! caller. The email uniqueness invariant is enforced by the database
//! constraint, never by a check-then-insert sequence, so two concurrent
//! registrations with the same email resolve to exactly one success and
//! one `DuplicateEmail`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, PgPool, Row};
use thiserror::Error;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A stored user record. The password hash never leaves the store layer
/// in serialized form.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub face_image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

/// Authentication method recorded in the audit trail. Both login paths
/// share this enumeration so their audit rows stay consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    Password,
    Faceid,
}

impl LoginMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Faceid => "faceid",
        }
    }

    fn from_db(value: &str) -> Self {
        match value {
            "faceid" => Self::Faceid,
            _ => Self::Password,
        }
    }
}

/// One successful authentication event. Immutable once created.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginEvent {
    pub method: LoginMethod,
    pub timestamp: DateTime<Utc>,
    pub user_agent: Option<String>,
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password"),
        face_image: row.get("face_image"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

/// Insert a new user, relying on the unique constraint for duplicate
/// detection.
pub async fn create_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, StoreError> {
    let query = r"
        INSERT INTO users (username, email, password)
        VALUES ($1, $2, $3)
        RETURNING id, email, username, password, face_image
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .instrument(span)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(err)
            }
        })?;

    Ok(user_from_row(&row))
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, StoreError> {
    let query = "SELECT id, email, username, password, face_image FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, StoreError> {
    let query = "SELECT id, email, username, password, face_image FROM users WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

/// Set or clear the enrolled face image. Passing `None` clears the
/// enrollment. Returns the updated user, or `None` for an unknown id.
pub async fn set_face_image(
    pool: &PgPool,
    user_id: Uuid,
    image: Option<&str>,
) -> Result<Option<User>, StoreError> {
    let query = r"
        UPDATE users SET face_image = $1 WHERE id = $2
        RETURNING id, email, username, password, face_image
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(image)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

pub async fn update_username(
    pool: &PgPool,
    user_id: Uuid,
    username: &str,
) -> Result<Option<User>, StoreError> {
    let query = r"
        UPDATE users SET username = $1 WHERE id = $2
        RETURNING id, email, username, password, face_image
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.as_ref().map(user_from_row))
}

/// Append one row to the audit trail. The timestamp is server-assigned.
pub async fn append_login(
    pool: &PgPool,
    user_id: Uuid,
    method: LoginMethod,
    user_agent: Option<&str>,
) -> Result<(), StoreError> {
    let query = "INSERT INTO logins (user_id, method, user_agent) VALUES ($1, $2, $3)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(method.as_str())
        .bind(user_agent)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}

/// Most recent login events for a user, newest first.
pub async fn recent_logins(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<LoginEvent>, StoreError> {
    let query = r"
        SELECT method, timestamp, user_agent FROM logins
        WHERE user_id = $1 ORDER BY timestamp DESC LIMIT $2
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .instrument(span)
        .await?;

    Ok(rows
        .iter()
        .map(|row| LoginEvent {
            method: LoginMethod::from_db(row.get("method")),
            timestamp: row.get("timestamp"),
            user_agent: row.get("user_agent"),
        })
        .collect())
}

/// All user summaries. The password hash column is never selected here.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserSummary>, StoreError> {
    let query = "SELECT id, email, username FROM users ORDER BY created_at";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query).fetch_all(pool).instrument(span).await?;

    Ok(rows
        .iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            email: row.get("email"),
            username: row.get("username"),
        })
        .collect())
}

/// Persist a support exchange (question and model response).
pub async fn insert_support_message(
    pool: &PgPool,
    message: &str,
    response: &str,
) -> Result<(), StoreError> {
    let query = "INSERT INTO support_messages (message, response) VALUES ($1, $2)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(message)
        .bind(response)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn login_method_round_trip() {
        assert_eq!(LoginMethod::Password.as_str(), "password");
        assert_eq!(LoginMethod::Faceid.as_str(), "faceid");
        assert_eq!(LoginMethod::from_db("password"), LoginMethod::Password);
        assert_eq!(LoginMethod::from_db("faceid"), LoginMethod::Faceid);
    }

    #[test]
    fn login_method_serializes_lowercase() {
        let json = serde_json::to_string(&LoginMethod::Faceid).unwrap();
        assert_eq!(json, "\"faceid\"");
    }
}
