pub mod api;
pub mod models;

/// Party id of the reserved bucket that holds users who have not joined a party.
pub const UNAFFILIATED_PARTY_ID: i64 = 1;
