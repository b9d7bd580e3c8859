use chrono::{DateTime, SubsecRound, Utc};
use tracing::info;

use placard_db::{Database, elections, parties, posters};
use placard_types::models::{Claims, PosterPlacementInfo};

use crate::claims::require_match;
use crate::error::{ApiError, ApiResult};
use crate::require_id;

/// Sets the party's election window, replacing any earlier one.
pub fn schedule(
    db: &Database,
    claims: &Claims,
    party_id: i64,
    admin_user_id: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    require_id(party_id, "partyId")?;
    require_id(admin_user_id, "adminUserId")?;
    // Compared at the precision the window is stored at
    let (start_date, end_date) = (start_date.trunc_subsecs(6), end_date.trunc_subsecs(6));
    if end_date <= now {
        return Err(ApiError::validation("election must be in the future"));
    }
    if start_date >= end_date {
        return Err(ApiError::validation("start must precede end"));
    }
    require_match(claims, admin_user_id, party_id)?;

    db.with_tx(|tx| {
        let party = parties::party_by_id(tx, party_id)?
            .ok_or_else(|| ApiError::conflict("party does not exist"))?;
        if party.admin_user_id != Some(admin_user_id) {
            return Err(ApiError::unauthorized("user is not admin of party"));
        }
        elections::upsert(tx, party_id, start_date, end_date)?;
        Ok(())
    })?;

    info!("Party {} election scheduled {} .. {}", party_id, start_date, end_date);
    Ok(())
}

/// Standing posters placed since the election opened, and the deadline by
/// which they have to come down.
pub fn outstanding_posters(
    db: &Database,
    claims: &Claims,
    party_id: i64,
    user_id: i64,
) -> ApiResult<(Vec<PosterPlacementInfo>, DateTime<Utc>)> {
    require_id(party_id, "partyId")?;
    require_id(user_id, "userId")?;
    require_match(claims, user_id, party_id)?;

    db.with_conn(|conn| {
        let election = elections::election_for(conn, party_id)?
            .ok_or_else(|| ApiError::conflict("party admin must schedule an election first"))?;
        let outstanding = posters::outstanding_since(conn, party_id, election.start_date)?;
        Ok((outstanding, election.end_date))
    })
}
