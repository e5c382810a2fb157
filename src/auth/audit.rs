//! Login audit recorder.
//!
//! Called exactly once per successful authentication, from both the
//! password and the biometric path; failed attempts are never recorded.
//! A thin, named wrapper over the store so the two paths cannot drift
//! in method enumeration or timestamp semantics.

use crate::store::{self, LoginMethod, StoreError};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Append one audit row for a successful authentication.
///
/// # Errors
///
/// Surfaces the underlying storage failure; the caller decides whether
/// the login still succeeds.
pub async fn record(
    pool: &PgPool,
    user_id: Uuid,
    method: LoginMethod,
    user_agent: Option<&str>,
) -> Result<(), StoreError> {
    store::append_login(pool, user_id, method, user_agent).await?;

    info!(%user_id, method = method.as_str(), "Recorded login event");

    Ok(())
}
