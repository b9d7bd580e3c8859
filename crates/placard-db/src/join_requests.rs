use anyhow::Result;
use placard_types::models::PendingMember;
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::{JoinRequestRow, decode_pending_member};

const PENDING_REQUEST: &str = "SELECT id, user_id, party_id, reviewed FROM join_requests
     WHERE user_id = ?1 AND party_id = ?2 AND reviewed = 0";
const REVOKE_PENDING: &str = "UPDATE join_requests SET reviewed = 1 WHERE user_id = ?1 AND reviewed = 0";
const INSERT_REQUEST: &str = "INSERT INTO join_requests (user_id, party_id) VALUES (?1, ?2)";
const MARK_REVIEWED: &str =
    "UPDATE join_requests SET reviewed = 1 WHERE user_id = ?1 AND party_id = ?2 AND reviewed = 0";
const PENDING_MEMBERS: &str = "SELECT u.id, u.username, COALESCE(i.first_name, ''), COALESCE(i.last_name, '')
     FROM join_requests r
     JOIN users u ON r.user_id = u.id
     LEFT JOIN userinfo i ON i.user_id = u.id
     WHERE r.party_id = ?1 AND r.reviewed = 0
     ORDER BY r.id";
const PENDING_COUNT: &str = "SELECT COUNT(*) FROM join_requests WHERE user_id = ?1 AND reviewed = 0";

pub fn pending_request(
    conn: &Connection,
    user_id: i64,
    party_id: i64,
) -> Result<Option<JoinRequestRow>> {
    conn.query_row(PENDING_REQUEST, [user_id, party_id], JoinRequestRow::decode)
        .optional()
}

/// Marks every unreviewed request of `user_id` as reviewed.
pub fn revoke_pending(conn: &Connection, user_id: i64) -> Result<usize> {
    Ok(conn.execute(REVOKE_PENDING, [user_id])?)
}

pub fn insert_request(conn: &Connection, user_id: i64, party_id: i64) -> Result<i64> {
    conn.execute(INSERT_REQUEST, [user_id, party_id])?;
    Ok(conn.last_insert_rowid())
}

/// Returns the number of requests closed; 0 means nothing was pending.
pub fn mark_reviewed(conn: &Connection, user_id: i64, party_id: i64) -> Result<usize> {
    Ok(conn.execute(MARK_REVIEWED, [user_id, party_id])?)
}

pub fn pending_members(conn: &Connection, party_id: i64) -> Result<Vec<PendingMember>> {
    let mut stmt = conn.prepare(PENDING_MEMBERS)?;
    let rows = stmt
        .query_map([party_id], decode_pending_member)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Count of unreviewed requests held by a user, across all parties.
pub fn pending_count(conn: &Connection, user_id: i64) -> Result<i64> {
    Ok(conn.query_row(PENDING_COUNT, [user_id], |r| r.get(0))?)
}
