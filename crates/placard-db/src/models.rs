//! Row types and their decoders. Each `decode` reads the columns in the order
//! the owning query module selects them.

use chrono::{DateTime, Utc};
use placard_types::models::{
    Election, Location, Party, PendingMember, PosterDelta, PosterPlacementInfo,
};
use rusqlite::Row;

/// Timestamps are stored as Unix microseconds, the finest unit a `DateTime`
/// arriving over the wire is compared at.
pub fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

pub fn from_micros(us: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us).ok_or(rusqlite::Error::IntegralValueOutOfRange(0, us))
}

pub struct AccountRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub party_id: i64,
    pub party_name: String,
}

impl AccountRow {
    pub fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            party_id: row.get(3)?,
            party_name: row.get(4)?,
        })
    }
}

pub fn decode_party(row: &Row<'_>) -> rusqlite::Result<Party> {
    Ok(Party {
        id: row.get(0)?,
        name: row.get(1)?,
        admin_user_id: row.get(2)?,
    })
}

pub struct PosterRow {
    pub id: i64,
    pub party_id: i64,
    pub user_id: i64,
    pub location: Location,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub removed: Option<DateTime<Utc>>,
    pub removed_by: Option<i64>,
}

impl PosterRow {
    pub fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            party_id: row.get(1)?,
            user_id: row.get(2)?,
            location: Location::new(row.get(3)?, row.get(4)?),
            created: from_micros(row.get(5)?)?,
            updated: from_micros(row.get(6)?)?,
            removed: row.get::<_, Option<i64>>(7)?.map(from_micros).transpose()?,
            removed_by: row.get(8)?,
        })
    }

    pub fn into_delta(self) -> PosterDelta {
        PosterDelta {
            poster_id: self.id,
            party_id: self.party_id,
            placed_by: self.user_id,
            location: self.location,
            removed: self.removed.is_some(),
            updated: self.updated,
        }
    }
}

pub struct JoinRequestRow {
    pub id: i64,
    pub user_id: i64,
    pub party_id: i64,
    pub reviewed: bool,
}

impl JoinRequestRow {
    pub fn decode(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            party_id: row.get(2)?,
            reviewed: row.get(3)?,
        })
    }
}

pub fn decode_pending_member(row: &Row<'_>) -> rusqlite::Result<PendingMember> {
    Ok(PendingMember {
        user_id: row.get(0)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
    })
}

pub fn decode_election(row: &Row<'_>) -> rusqlite::Result<Election> {
    Ok(Election {
        party_id: row.get(0)?,
        start_date: from_micros(row.get(1)?)?,
        end_date: from_micros(row.get(2)?)?,
    })
}

pub fn decode_placement_info(row: &Row<'_>) -> rusqlite::Result<PosterPlacementInfo> {
    Ok(PosterPlacementInfo {
        poster_id: row.get(0)?,
        location: Location::new(row.get(1)?, row.get(2)?),
        placed_by: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        created: from_micros(row.get(6)?)?,
    })
}
