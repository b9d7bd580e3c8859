use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point on the map, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both coordinates are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: i64,
    pub name: String,
    pub admin_user_id: Option<i64>,
}

/// A poster that changed after the caller's watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterDelta {
    pub poster_id: i64,
    pub party_id: i64,
    pub placed_by: i64,
    pub location: Location,
    pub removed: bool,
    pub updated: DateTime<Utc>,
}

/// An unreviewed join request, joined with the requester's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMember {
    pub user_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// A poster still standing after an election opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosterPlacementInfo {
    pub poster_id: i64,
    pub location: Location,
    pub placed_by: i64,
    pub first_name: String,
    pub last_name: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipStats {
    pub placed_count: i64,
    pub removed_count: i64,
    pub party_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    pub party_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

// -- Token claims --

/// Identity embedded in a signed credential. Shared by the token service and
/// every handler that gates on `matches`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub party_id: i64,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Expired,
    Malformed,
}

impl Claims {
    /// Judges expiry against `now` (Unix seconds). Signature problems are
    /// reported as `Malformed` by the decoder before this is reached.
    pub fn validity(&self, now: i64) -> Validity {
        if self.iat > self.exp {
            Validity::Malformed
        } else if now >= self.exp {
            Validity::Expired
        } else {
            Validity::Valid
        }
    }

    /// Exact match on both the user and the party the caller claims to act for.
    pub fn matches(&self, user_id: i64, party_id: i64) -> bool {
        self.sub == user_id && self.party_id == party_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(iat: i64, exp: i64) -> Claims {
        Claims {
            sub: 7,
            username: "test".into(),
            party_id: 3,
            iat,
            exp,
        }
    }

    #[test]
    fn validity_tracks_expiry() {
        let c = claims(1_000, 2_000);
        assert_eq!(c.validity(1_500), Validity::Valid);
        assert_eq!(c.validity(2_000), Validity::Expired);
        assert_eq!(c.validity(9_999), Validity::Expired);
    }

    #[test]
    fn issued_after_expiry_is_malformed() {
        assert_eq!(claims(3_000, 2_000).validity(1_000), Validity::Malformed);
    }

    #[test]
    fn matches_requires_both_fields() {
        let c = claims(0, 1);
        assert!(c.matches(7, 3));
        assert!(!c.matches(7, 1));
        assert!(!c.matches(8, 3));
    }

    #[test]
    fn location_bounds() {
        assert!(Location::new(53.3498, -6.2603).is_valid());
        assert!(!Location::new(91.0, 0.0).is_valid());
        assert!(!Location::new(0.0, f64::NAN).is_valid());
    }
}
