use crate::db::DbPool;
use crate::models::{NewSession, User};
use crate::schema::{sessions, users};
use anyhow::Context;
use chrono::{Duration, Utc};
use diesel::prelude::*;

use super::crypto::{generate_token, hash_token};

pub const SESSION_TTL_DAYS: i64 = 30;

/// Issue a new API session for `user_id` and return the plaintext token.
pub fn create_session(conn: &mut PgConnection, user_id: uuid::Uuid) -> anyhow::Result<String> {
    let token = generate_token()?;
    let token_hash = hash_token(&token);
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

    let new_session = NewSession {
        user_id,
        token_hash: &token_hash,
        expires_at,
    };

    diesel::insert_into(sessions::table)
        .values(&new_session)
        .execute(conn)?;

    Ok(token)
}

/// Look up the unexpired session's user. `Ok(None)` means the token is
/// unknown or expired; `Err` means the database couldn't be asked.
pub fn get_user_from_token(pool: &DbPool, token: &str) -> anyhow::Result<Option<User>> {
    let mut conn = pool.get().context("Failed to get DB connection for auth")?;
    let token_hash = hash_token(token);

    let user = sessions::table
        .inner_join(users::table)
        .filter(sessions::token_hash.eq(&token_hash))
        .filter(sessions::expires_at.gt(Utc::now()))
        .select(User::as_select())
        .first(&mut conn)
        .optional()
        .context("Failed to look up session")?;

    Ok(user)
}
