use anyhow::Result;
use placard_types::UNAFFILIATED_PARTY_ID;
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::AccountRow;

const USERNAME_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)";
const INSERT_USER: &str = "INSERT INTO users (username, password, party_id) VALUES (?1, ?2, ?3)";
const INSERT_USERINFO: &str =
    "INSERT INTO userinfo (user_id, first_name, last_name) VALUES (?1, ?2, ?3)";
const ACCOUNT_BY_USERNAME: &str = "SELECT u.id, u.username, u.password, u.party_id, p.name
     FROM users u
     JOIN parties p ON u.party_id = p.id
     WHERE u.username = ?1";
const IS_MEMBER: &str = "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1 AND party_id = ?2)";
const PARTY_OF_USER: &str = "SELECT party_id FROM users WHERE id = ?1";
const SET_PARTY: &str = "UPDATE users SET party_id = ?2 WHERE id = ?1";
const LEAVE_UNAFFILIATED: &str = "UPDATE users SET party_id = ?2 WHERE id = ?1 AND party_id = ?3";

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool> {
    Ok(conn.query_row(USERNAME_EXISTS, [username], |r| r.get(0))?)
}

/// New accounts start in the unaffiliated bucket.
pub fn insert_user(conn: &Connection, username: &str, password_hash: &str) -> Result<i64> {
    conn.execute(
        INSERT_USER,
        rusqlite::params![username, password_hash, UNAFFILIATED_PARTY_ID],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_userinfo(
    conn: &Connection,
    user_id: i64,
    first_name: &str,
    last_name: &str,
) -> Result<()> {
    conn.execute(INSERT_USERINFO, rusqlite::params![user_id, first_name, last_name])?;
    Ok(())
}

pub fn account_by_username(conn: &Connection, username: &str) -> Result<Option<AccountRow>> {
    conn.query_row(ACCOUNT_BY_USERNAME, [username], AccountRow::decode)
        .optional()
}

pub fn is_member(conn: &Connection, user_id: i64, party_id: i64) -> Result<bool> {
    Ok(conn.query_row(IS_MEMBER, [user_id, party_id], |r| r.get(0))?)
}

pub fn party_of_user(conn: &Connection, user_id: i64) -> Result<Option<i64>> {
    conn.query_row(PARTY_OF_USER, [user_id], |r| r.get(0))
        .optional()
}

/// Returns the number of rows changed (0 when the user does not exist).
pub fn set_party(conn: &Connection, user_id: i64, party_id: i64) -> Result<usize> {
    Ok(conn.execute(SET_PARTY, [user_id, party_id])?)
}

/// Moves a user out of the unaffiliated bucket. Changes nothing, and returns 0,
/// if the user has meanwhile joined some other party.
pub fn leave_unaffiliated(conn: &Connection, user_id: i64, party_id: i64) -> Result<usize> {
    Ok(conn.execute(LEAVE_UNAFFILIATED, [user_id, party_id, UNAFFILIATED_PARTY_ID])?)
}
