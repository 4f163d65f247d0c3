use sqlx::MySqlPool;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::models::session::SessionUser;

pub const PERSISTENT_SESSION_DAYS: i64 = 10;
pub const SHORT_SESSION_MINUTES: i64 = 30;

pub fn session_expiry(now: OffsetDateTime, remember_me: bool) -> OffsetDateTime {
    if remember_me {
        now + Duration::days(PERSISTENT_SESSION_DAYS)
    } else {
        now + Duration::minutes(SHORT_SESSION_MINUTES)
    }
}

pub async fn create_session(
    pool: &MySqlPool,
    user_id: i64,
    remember_me: bool,
) -> Result<String, sqlx::Error> {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = session_expiry(OffsetDateTime::now_utc(), remember_me);

    sqlx::query(
        "INSERT INTO sessions (session_id, user_id, expires_at, is_persistent) VALUES (?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(user_id)
    .bind(expires_at)
    .bind(remember_me)
    .execute(pool)
    .await?;

    Ok(session_id)
}

// Only live sessions of active users resolve to a caller
pub async fn find_session_user(
    pool: &MySqlPool,
    session_id: &str,
) -> Result<Option<SessionUser>, sqlx::Error> {
    sqlx::query_as::<_, SessionUser>(
        "SELECT u.id AS user_id, u.tenant_id
         FROM sessions s
         JOIN users u ON s.user_id = u.id
         WHERE s.session_id = ? AND s.expires_at > ? AND u.is_active = TRUE",
    )
    .bind(session_id)
    .bind(OffsetDateTime::now_utc())
    .fetch_optional(pool)
    .await
}

pub async fn delete_session(pool: &MySqlPool, session_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
        .bind(session_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn purge_expired_sessions(pool: &MySqlPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
        .bind(OffsetDateTime::now_utc())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn remember_me_selects_long_lifetime() {
        let now = datetime!(2024-05-01 12:00 UTC);
        assert_eq!(session_expiry(now, true), datetime!(2024-05-11 12:00 UTC));
        assert_eq!(session_expiry(now, false), datetime!(2024-05-01 12:30 UTC));
    }
}
