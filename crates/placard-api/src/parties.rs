//! Party directory: creation, listing, and per-member statistics.

use tracing::info;

use placard_db::{Database, accounts, join_requests, parties};
use placard_types::UNAFFILIATED_PARTY_ID;
use placard_types::models::{Claims, MembershipStats, Party};

use crate::claims::{TokenService, require_match};
use crate::error::{ApiError, ApiResult};
use crate::require_id;

/// A newly created party and the re-minted credential of its admin.
#[derive(Debug)]
pub struct CreatedParty {
    pub party_id: i64,
    pub token: String,
}

/// Creates `name` with `user_id` as admin and moves the user into it.
///
/// The party insert, the membership update and the credential mint succeed or
/// fail together. If the user's membership changed between the checks and the
/// update, nothing is written.
pub fn create_party(
    db: &Database,
    tokens: &TokenService,
    claims: &Claims,
    name: &str,
    user_id: i64,
) -> ApiResult<CreatedParty> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("party name not set"));
    }
    require_id(user_id, "userId")?;
    if claims.sub != user_id {
        return Err(ApiError::unauthorized("invalid credential"));
    }

    let created = db.with_tx(|tx| {
        if parties::party_administered_by(tx, user_id)?.is_some() {
            return Err(ApiError::conflict("user is already admin of a party"));
        }
        match accounts::party_of_user(tx, user_id)? {
            None => return Err(ApiError::conflict("user does not exist")),
            Some(UNAFFILIATED_PARTY_ID) => {}
            Some(_) => return Err(ApiError::conflict("user already belongs to a party")),
        }
        if parties::name_exists(tx, name)? {
            return Err(ApiError::conflict("party name already exists"));
        }

        let party_id = parties::insert_party(tx, name, user_id)?;
        if accounts::leave_unaffiliated(tx, user_id, party_id)? == 0 {
            return Err(ApiError::conflict("membership changed while creating party"));
        }
        // Outstanding requests to other parties no longer apply
        join_requests::revoke_pending(tx, user_id)?;

        let token = tokens.mint(user_id, &claims.username, party_id)?;
        Ok(CreatedParty { party_id, token })
    })?;

    info!("Party '{}' ({}) created by user {}", name, created.party_id, user_id);
    Ok(created)
}

pub fn list_parties(db: &Database) -> ApiResult<Vec<Party>> {
    db.with_conn(|conn| parties::list(conn).map_err(ApiError::from))
}

pub fn membership_stats(
    db: &Database,
    claims: &Claims,
    user_id: i64,
    party_id: i64,
) -> ApiResult<MembershipStats> {
    require_id(user_id, "userId")?;
    require_id(party_id, "partyId")?;
    require_match(claims, user_id, party_id)?;

    db.with_conn(|conn| parties::membership_stats(conn, user_id, party_id).map_err(ApiError::from))?
        .ok_or_else(|| ApiError::conflict("party does not exist"))
}
