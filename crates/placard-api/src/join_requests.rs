//! Join request workflow. A request is pending until an admin reviews it;
//! a user holds at most one pending request at a time.

use chrono::Utc;
use tracing::info;

use placard_db::{Database, accounts, join_requests, parties, posters};
use placard_types::UNAFFILIATED_PARTY_ID;
use placard_types::models::{Claims, Party, PendingMember};

use crate::claims::require_match;
use crate::error::{ApiError, ApiResult};
use crate::require_id;

/// Records that `user_id` wants to join `party_id`. Any earlier pending
/// request of the user is closed in the same transaction.
pub fn join_party(db: &Database, claims: &Claims, user_id: i64, party_id: i64) -> ApiResult<()> {
    require_id(user_id, "userId")?;
    require_id(party_id, "partyId")?;
    if party_id == UNAFFILIATED_PARTY_ID {
        return Err(ApiError::validation("cannot request to join the unaffiliated bucket"));
    }
    if claims.sub != user_id {
        return Err(ApiError::unauthorized("invalid credential"));
    }

    db.with_tx(|tx| {
        if parties::party_by_id(tx, party_id)?.is_none() {
            return Err(ApiError::conflict("party does not exist"));
        }
        if parties::party_administered_by(tx, user_id)?.is_some() {
            return Err(ApiError::conflict("user is admin of a party"));
        }
        match accounts::party_of_user(tx, user_id)? {
            None => return Err(ApiError::conflict("user does not exist")),
            Some(UNAFFILIATED_PARTY_ID) => {}
            Some(_) => return Err(ApiError::conflict("user already belongs to a party")),
        }
        if join_requests::pending_request(tx, user_id, party_id)?.is_some() {
            return Err(ApiError::conflict("join request already pending"));
        }

        let revoked = join_requests::revoke_pending(tx, user_id)?;
        join_requests::insert_request(tx, user_id, party_id)?;
        info!(
            "User {} requested to join party {} ({} earlier request(s) closed)",
            user_id, party_id, revoked
        );
        Ok(())
    })
}

fn require_admin(party: Option<Party>, admin_user_id: i64) -> ApiResult<Party> {
    let party = party.ok_or_else(|| ApiError::conflict("party does not exist"))?;
    if party.admin_user_id != Some(admin_user_id) {
        return Err(ApiError::unauthorized("user is not admin of party"));
    }
    Ok(party)
}

/// Reviews a batch of requests. Every approval moves the member and their
/// posters into the party. If any approved member has no pending request the
/// whole batch, denials included, is rolled back.
pub fn approve_members(
    db: &Database,
    claims: &Claims,
    party_id: i64,
    admin_user_id: i64,
    approved: &[i64],
    denied: &[i64],
) -> ApiResult<()> {
    require_id(party_id, "partyId")?;
    require_id(admin_user_id, "adminUserId")?;
    require_match(claims, admin_user_id, party_id)?;

    let now = Utc::now();
    db.with_tx(|tx| {
        require_admin(parties::party_by_id(tx, party_id)?, admin_user_id)?;

        for &member in approved {
            if join_requests::mark_reviewed(tx, member, party_id)? == 0 {
                return Err(ApiError::conflict(format!(
                    "user {} has no pending request to join party {}",
                    member, party_id
                )));
            }
            if accounts::set_party(tx, member, party_id)? == 0 {
                return Err(ApiError::conflict(format!("user {} does not exist", member)));
            }
            posters::reassign_user_posters(tx, member, party_id, now)?;
        }
        for &member in denied {
            join_requests::mark_reviewed(tx, member, party_id)?;
        }
        Ok(())
    })?;

    info!(
        "Party {}: {} member(s) approved, {} denied",
        party_id,
        approved.len(),
        denied.len()
    );
    Ok(())
}

pub fn pending_members(
    db: &Database,
    claims: &Claims,
    party_id: i64,
    admin_user_id: i64,
) -> ApiResult<Vec<PendingMember>> {
    require_id(party_id, "partyId")?;
    require_id(admin_user_id, "adminUserId")?;
    require_match(claims, admin_user_id, party_id)?;

    db.with_conn(|conn| {
        require_admin(parties::party_by_id(conn, party_id)?, admin_user_id)?;
        Ok(join_requests::pending_members(conn, party_id)?)
    })
}
