//! Synchronous user and level queries, run on the connection thread.

use chrono::{DateTime, Utc};
use perk_core::{
  Caller, Error as CoreError,
  level::{DEFAULT_LEVEL_NAME, LoyaltyLevel},
  user::{NewUser, User, UserProfile},
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Result,
  encode::{LEVEL_COLUMNS, RawLevel, RawUser, USER_COLUMNS, encode_dt, encode_uuid},
};

pub fn read_user(conn: &Connection, id: Uuid) -> Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawUser::read,
    )
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

pub fn read_level(conn: &Connection, id: Uuid) -> Result<Option<LoyaltyLevel>> {
  conn
    .query_row(
      &format!("SELECT {LEVEL_COLUMNS} FROM loyalty_levels WHERE level_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawLevel::read,
    )
    .optional()?
    .map(RawLevel::into_level)
    .transpose()
}

/// The user's level, if they have one and it still exists.
pub fn level_of(conn: &Connection, user: &User) -> Result<Option<LoyaltyLevel>> {
  match user.loyalty_level_id {
    Some(id) => read_level(conn, id),
    None => Ok(None),
  }
}

pub fn read_profile(conn: &Connection, caller: Caller) -> Result<Option<UserProfile>> {
  let Some(user) = read_user(conn, caller.user_id)? else {
    return Ok(None);
  };
  let level = level_of(conn, &user)?;
  Ok(Some(UserProfile { user, level }))
}

/// Insert the caller's row at the default level with a zero balance.
pub fn register(
  conn: &mut Connection,
  caller: Caller,
  input: &NewUser,
  at: DateTime<Utc>,
) -> Result<User> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  if read_user(&tx, caller.user_id)?.is_some() {
    return Err(CoreError::AlreadyRegistered(caller.user_id).into());
  }

  let level_id: Option<String> = tx
    .query_row(
      "SELECT level_id FROM loyalty_levels WHERE name = ?1",
      rusqlite::params![DEFAULT_LEVEL_NAME],
      |r| r.get(0),
    )
    .optional()?;

  let at_str = encode_dt(at);
  tx.execute(
    "INSERT INTO users (
       user_id, email, full_name, points,
       loyalty_level_id, created_at, updated_at
     ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?5)",
    rusqlite::params![
      encode_uuid(caller.user_id),
      input.email,
      input.full_name,
      level_id,
      at_str,
    ],
  )?;

  let user = read_user(&tx, caller.user_id)?
    .ok_or(CoreError::UserNotFound(caller.user_id))?;
  tx.commit()?;
  Ok(user)
}

pub fn update_full_name(
  conn: &Connection,
  caller: Caller,
  full_name: Option<&str>,
  at: DateTime<Utc>,
) -> Result<User> {
  let changed = conn.execute(
    "UPDATE users SET full_name = ?1, updated_at = ?2 WHERE user_id = ?3",
    rusqlite::params![full_name, encode_dt(at), encode_uuid(caller.user_id)],
  )?;
  if changed == 0 {
    return Err(CoreError::UserNotFound(caller.user_id).into());
  }
  read_user(conn, caller.user_id)?
    .ok_or_else(|| CoreError::UserNotFound(caller.user_id).into())
}
