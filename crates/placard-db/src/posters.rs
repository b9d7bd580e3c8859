use anyhow::Result;
use chrono::{DateTime, Utc};
use placard_types::models::{Location, PosterPlacementInfo};
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::{PosterRow, decode_placement_info, to_micros};

const POSTER_COLUMNS: &str = "id, party_id, user_id, lat, lng, created, updated, removed, removed_by";

const INSERT_POSTER: &str = "INSERT INTO posters (party_id, user_id, lat, lng, created, updated)
     VALUES (?1, ?2, ?3, ?4, ?5, ?5)";

// Ties on exact distance fall back to SQLite's row visit order, which is not
// guaranteed to be stable.
const REMOVE_NEAREST: &str = "UPDATE posters SET removed = ?5, removed_by = ?6, updated = ?5
     WHERE id = (
         SELECT id FROM posters
         WHERE party_id = ?1
           AND removed IS NULL
           AND distance_sphere(lat, lng, ?2, ?3) < ?4
         ORDER BY distance_sphere(lat, lng, ?2, ?3) ASC
         LIMIT 1
     )
     RETURNING id";

const REASSIGN_USER_POSTERS: &str =
    "UPDATE posters SET party_id = ?2, updated = ?3 WHERE user_id = ?1 AND party_id != ?2";

const OUTSTANDING_SINCE: &str = "SELECT p.id, p.lat, p.lng, p.user_id,
            COALESCE(i.first_name, ''), COALESCE(i.last_name, ''), p.created
     FROM posters p
     LEFT JOIN userinfo i ON i.user_id = p.user_id
     WHERE p.party_id = ?1 AND p.removed IS NULL AND p.created > ?2
     ORDER BY p.created";

pub fn insert_poster(
    conn: &Connection,
    party_id: i64,
    user_id: i64,
    location: Location,
    now: DateTime<Utc>,
) -> Result<i64> {
    conn.execute(
        INSERT_POSTER,
        rusqlite::params![party_id, user_id, location.lat, location.lng, to_micros(now)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Soft-removes the closest standing poster of `party_id` that lies strictly
/// within `radius_m` metres of `location`, in one statement. Returns the
/// poster id, or `None` when nothing is in range.
pub fn remove_nearest(
    conn: &Connection,
    party_id: i64,
    location: Location,
    radius_m: f64,
    removed_by: i64,
    now: DateTime<Utc>,
) -> Result<Option<i64>> {
    conn.query_row(
        REMOVE_NEAREST,
        rusqlite::params![
            party_id,
            location.lat,
            location.lng,
            radius_m,
            to_micros(now),
            removed_by
        ],
        |r| r.get(0),
    )
    .optional()
}

/// Moves every poster a user placed into `party_id`, bumping `updated`.
pub fn reassign_user_posters(
    conn: &Connection,
    user_id: i64,
    party_id: i64,
    now: DateTime<Utc>,
) -> Result<usize> {
    Ok(conn.execute(
        REASSIGN_USER_POSTERS,
        rusqlite::params![user_id, party_id, to_micros(now)],
    )?)
}

/// Posters of a party whose `updated` is strictly after `since`.
pub fn updated_since(
    conn: &Connection,
    party_id: i64,
    since: DateTime<Utc>,
) -> Result<Vec<PosterRow>> {
    let sql = format!(
        "SELECT {POSTER_COLUMNS} FROM posters WHERE party_id = ?1 AND updated > ?2 ORDER BY updated, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params![party_id, to_micros(since)], PosterRow::decode)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn poster_by_id(conn: &Connection, id: i64) -> Result<Option<PosterRow>> {
    let sql = format!("SELECT {POSTER_COLUMNS} FROM posters WHERE id = ?1");
    conn.query_row(&sql, [id], PosterRow::decode).optional()
}

/// Standing posters of a party placed after `start`, with the placer's name.
pub fn outstanding_since(
    conn: &Connection,
    party_id: i64,
    start: DateTime<Utc>,
) -> Result<Vec<PosterPlacementInfo>> {
    let mut stmt = conn.prepare(OUTSTANDING_SINCE)?;
    let rows = stmt
        .query_map(rusqlite::params![party_id, to_micros(start)], decode_placement_info)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
