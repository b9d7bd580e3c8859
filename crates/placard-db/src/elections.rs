use anyhow::Result;
use chrono::{DateTime, Utc};
use placard_types::models::Election;
use rusqlite::Connection;

use crate::OptionalExt;
use crate::models::{decode_election, to_micros};

const UPSERT_ELECTION: &str = "INSERT INTO elections (party_id, start_date, end_date) VALUES (?1, ?2, ?3)
     ON CONFLICT(party_id) DO UPDATE SET start_date = excluded.start_date, end_date = excluded.end_date";
const ELECTION_FOR: &str = "SELECT party_id, start_date, end_date FROM elections WHERE party_id = ?1";

/// Writes the party's single election row, replacing any earlier window.
pub fn upsert(
    conn: &Connection,
    party_id: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        UPSERT_ELECTION,
        rusqlite::params![party_id, to_micros(start_date), to_micros(end_date)],
    )?;
    Ok(())
}

pub fn election_for(conn: &Connection, party_id: i64) -> Result<Option<Election>> {
    conn.query_row(ELECTION_FOR, [party_id], decode_election)
        .optional()
}
