//! Poster lifecycle: placement, nearest-match removal and the delta feed.
//!
//! Posters are never deleted. Removal stamps `removed` once and the poster
//! drops out of every later removal search.

use chrono::{DateTime, Utc};
use tracing::info;

use placard_db::{Database, accounts, posters};
use rusqlite::Connection;
use placard_types::models::{Claims, Location, PosterDelta};

use crate::claims::require_match;
use crate::error::{ApiError, ApiResult};
use crate::require_id;

/// A credential minted before a membership change still matches its old
/// party; the stored membership is what counts.
fn require_member(conn: &Connection, user_id: i64, party_id: i64) -> ApiResult<()> {
    if !accounts::is_member(conn, user_id, party_id)? {
        return Err(ApiError::unauthorized("user is not a member of party"));
    }
    Ok(())
}

fn require_location(location: Option<Location>) -> ApiResult<Location> {
    let location = location.ok_or_else(|| ApiError::validation("poster location not set"))?;
    if !location.is_valid() {
        return Err(ApiError::validation("poster location out of range"));
    }
    Ok(location)
}

pub fn place(
    db: &Database,
    claims: &Claims,
    party_id: i64,
    user_id: i64,
    location: Option<Location>,
) -> ApiResult<i64> {
    require_id(user_id, "userId")?;
    require_id(party_id, "partyId")?;
    let location = require_location(location)?;
    require_match(claims, user_id, party_id)?;

    let poster_id = db.with_tx(|tx| {
        require_member(tx, user_id, party_id)?;
        posters::insert_poster(tx, party_id, user_id, location, Utc::now())
            .map_err(|e| ApiError::from(e.context("failed to insert poster")))
    })?;

    info!("Poster {} placed by user {} for party {}", poster_id, user_id, party_id);
    Ok(poster_id)
}

/// Removes the party's standing poster nearest to `location`, provided it is
/// closer than `radius_m` metres. Exact distance ties resolve in storage order.
pub fn remove(
    db: &Database,
    claims: &Claims,
    radius_m: f64,
    party_id: i64,
    user_id: i64,
    location: Option<Location>,
) -> ApiResult<i64> {
    require_id(user_id, "userId")?;
    require_id(party_id, "partyId")?;
    let location = require_location(location)?;
    require_match(claims, user_id, party_id)?;

    let poster_id = db
        .with_tx(|tx| {
            require_member(tx, user_id, party_id)?;
            posters::remove_nearest(tx, party_id, location, radius_m, user_id, Utc::now())
                .map_err(ApiError::from)
        })?
        .ok_or_else(|| ApiError::conflict(format!("no posters found within {} meters", radius_m)))?;

    info!("Poster {} removed by user {}", poster_id, user_id);
    Ok(poster_id)
}

/// Every poster of the party changed strictly after `since`.
pub fn updates(
    db: &Database,
    claims: &Claims,
    party_id: i64,
    user_id: i64,
    since: Option<DateTime<Utc>>,
) -> ApiResult<Vec<PosterDelta>> {
    require_id(user_id, "userId")?;
    require_id(party_id, "partyId")?;
    let since = since.ok_or_else(|| ApiError::validation("lastUpdated not set"))?;
    require_match(claims, user_id, party_id)?;

    let rows = db.with_conn(|conn| posters::updated_since(conn, party_id, since).map_err(ApiError::from))?;
    Ok(rows.into_iter().map(|row| row.into_delta()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Duration;

    const RADIUS: f64 = 20.0;
    const PARTY: i64 = 1;

    fn setup() -> (Database, i64, Claims) {
        let db = crate::testutil::db();
        let user = crate::testutil::user(&db, "poster");
        let claims = crate::testutil::claims(user, PARTY);
        (db, user, claims)
    }

    /// A point `metres` due north of `origin`.
    fn north_of(origin: Location, metres: f64) -> Location {
        let degrees = metres / placard_db::geo::EARTH_RADIUS_M * 180.0 / std::f64::consts::PI;
        Location::new(origin.lat + degrees, origin.lng)
    }

    #[test]
    fn remove_within_radius_then_not_again() {
        let (db, user, claims) = setup();
        let dublin = Location::new(53.3498, -6.2603);
        let id = place(&db, &claims, PARTY, user, Some(dublin)).unwrap();

        let near = north_of(dublin, 15.0);
        assert_eq!(remove(&db, &claims, RADIUS, PARTY, user, Some(near)).unwrap(), id);

        let err = remove(&db, &claims, RADIUS, PARTY, user, Some(near)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "no posters found within 20 meters");

        let row = db.with_conn(|c| posters::poster_by_id(c, id)).unwrap().unwrap();
        assert!(row.removed.is_some());
        assert_eq!(row.removed_by, Some(user));
    }

    #[test]
    fn poster_outside_radius_is_not_matched() {
        let (db, user, claims) = setup();
        let dublin = Location::new(53.3498, -6.2603);
        place(&db, &claims, PARTY, user, Some(dublin)).unwrap();

        let far = north_of(dublin, 25.0);
        let err = remove(&db, &claims, RADIUS, PARTY, user, Some(far)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn nearest_of_several_is_removed() {
        let (db, user, claims) = setup();
        let origin = Location::new(53.3498, -6.2603);
        let far = place(&db, &claims, PARTY, user, Some(north_of(origin, 12.0))).unwrap();
        let near = place(&db, &claims, PARTY, user, Some(north_of(origin, 4.0))).unwrap();

        assert_eq!(remove(&db, &claims, RADIUS, PARTY, user, Some(origin)).unwrap(), near);
        assert_eq!(remove(&db, &claims, RADIUS, PARTY, user, Some(origin)).unwrap(), far);
    }

    // Removal resolves by location, not by the exact poster id an earlier
    // protocol revision took. Ownership is still enforced: a poster of another
    // party standing on the same spot is never a candidate.
    #[test]
    fn other_party_posters_are_ignored() {
        let (db, user, claims) = setup();
        let tokens = crate::testutil::tokens();
        let rival = crate::testutil::user(&db, "rival");
        let reds = crate::parties::create_party(&db, &tokens, &crate::testutil::claims(rival, 1), "Reds", rival)
            .unwrap()
            .party_id;
        let spot = Location::new(10.0, 10.0);
        place(&db, &crate::testutil::claims(rival, reds), reds, rival, Some(spot)).unwrap();

        let err = remove(&db, &claims, RADIUS, PARTY, user, Some(spot)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn delta_feed_reports_placement_then_removal() {
        let (db, user, claims) = setup();
        let before = Utc::now() - Duration::milliseconds(1);
        let spot = Location::new(53.3498, -6.2603);
        let id = place(&db, &claims, PARTY, user, Some(spot)).unwrap();

        let feed = updates(&db, &claims, PARTY, user, Some(before)).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].poster_id, id);
        assert_eq!(feed[0].placed_by, user);
        assert_eq!(feed[0].location, spot);
        assert!(!feed[0].removed);

        remove(&db, &claims, RADIUS, PARTY, user, Some(spot)).unwrap();
        let feed = updates(&db, &claims, PARTY, user, Some(before)).unwrap();
        assert_eq!(feed.len(), 1);
        assert!(feed[0].removed);

        let later = feed[0].updated;
        assert!(updates(&db, &claims, PARTY, user, Some(later)).unwrap().is_empty());
    }

    #[test]
    fn delta_feed_keeps_changes_within_the_same_millisecond() {
        let (db, user, claims) = setup();
        let mutation = DateTime::from_timestamp(2_000_000_000, 700_000).unwrap();
        let id = db
            .with_conn(|c| posters::insert_poster(c, PARTY, user, Location::new(53.0, -6.0), mutation))
            .unwrap();

        let feed = updates(&db, &claims, PARTY, user, Some(mutation - Duration::microseconds(400))).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].poster_id, id);
        assert_eq!(feed[0].updated, mutation);

        let feed = updates(&db, &claims, PARTY, user, Some(mutation - Duration::nanoseconds(300))).unwrap();
        assert_eq!(feed.len(), 1);

        assert!(updates(&db, &claims, PARTY, user, Some(mutation)).unwrap().is_empty());
        let just_after = mutation + Duration::nanoseconds(300);
        assert!(updates(&db, &claims, PARTY, user, Some(just_after)).unwrap().is_empty());
    }

    #[test]
    fn missing_fields_and_mismatched_claims_fail_before_storage() {
        let (db, user, claims) = setup();
        let spot = Some(Location::new(1.0, 1.0));

        assert_eq!(place(&db, &claims, PARTY, user, None).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(place(&db, &claims, 0, user, spot).unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            place(&db, &claims, PARTY, user, Some(Location::new(120.0, 0.0))).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(place(&db, &claims, 2, user, spot).unwrap_err().kind(), ErrorKind::Authorization);
        assert_eq!(updates(&db, &claims, PARTY, user, None).unwrap_err().kind(), ErrorKind::Validation);
    }
}
