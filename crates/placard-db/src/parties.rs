use anyhow::Result;
use placard_types::UNAFFILIATED_PARTY_ID;
use placard_types::models::{MembershipStats, Party};
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::decode_party;

const INSERT_PARTY: &str = "INSERT INTO parties (name, admin_user_id) VALUES (?1, ?2)";
const PARTY_BY_ID: &str = "SELECT id, name, admin_user_id FROM parties WHERE id = ?1";
const NAME_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM parties WHERE name = ?1)";
const PARTY_ADMINISTERED_BY: &str =
    "SELECT id, name, admin_user_id FROM parties WHERE admin_user_id = ?1";
const LIST_PARTIES: &str =
    "SELECT id, name, admin_user_id FROM parties WHERE id != ?1 ORDER BY name";
const MEMBERSHIP_STATS: &str = "SELECT
        (SELECT COUNT(*) FROM posters WHERE user_id = ?1),
        (SELECT COUNT(*) FROM posters WHERE removed_by = ?1),
        p.name
     FROM parties p
     WHERE p.id = ?2";

pub fn insert_party(conn: &Connection, name: &str, admin_user_id: i64) -> Result<i64> {
    conn.execute(INSERT_PARTY, rusqlite::params![name, admin_user_id])?;
    Ok(conn.last_insert_rowid())
}

pub fn party_by_id(conn: &Connection, id: i64) -> Result<Option<Party>> {
    conn.query_row(PARTY_BY_ID, [id], decode_party).optional()
}

pub fn name_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.query_row(NAME_EXISTS, [name], |r| r.get(0))?)
}

pub fn party_administered_by(conn: &Connection, user_id: i64) -> Result<Option<Party>> {
    conn.query_row(PARTY_ADMINISTERED_BY, [user_id], decode_party)
        .optional()
}

/// Every party except the unaffiliated bucket, ordered by name.
pub fn list(conn: &Connection) -> Result<Vec<Party>> {
    let mut stmt = conn.prepare(LIST_PARTIES)?;
    let rows = stmt
        .query_map([UNAFFILIATED_PARTY_ID], decode_party)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn membership_stats(
    conn: &Connection,
    user_id: i64,
    party_id: i64,
) -> Result<Option<MembershipStats>> {
    conn.query_row(MEMBERSHIP_STATS, [user_id, party_id], |row| {
        Ok(MembershipStats {
            placed_count: row.get(0)?,
            removed_count: row.get(1)?,
            party_name: row.get(2)?,
        })
    })
    .optional()
}
