use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Location, Party, PendingMember, PosterDelta, PosterPlacementInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Ok,
    Failed,
}

/// Every successful response body: `{"code":"OK", ...payload}`.
#[derive(Debug, Serialize)]
pub struct Reply<T> {
    pub code: ResponseCode,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Reply<T> {
    pub fn ok(body: T) -> Self {
        Self {
            code: ResponseCode::Ok,
            body,
        }
    }
}

/// Failure body: `{"code":"FAILED","error":"..."}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ResponseCode,
    pub error: String,
}

// -- Accounts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub party_name: String,
    pub user_id: i64,
    pub party_id: i64,
}

// -- Parties --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePartyRequest {
    pub name: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CreatePartyResponse {
    pub party_id: i64,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct PartiesResponse {
    pub parties: Vec<Party>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinPartyRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApproveMembersRequest {
    pub admin_user_id: i64,
    #[serde(default)]
    pub approved: Vec<i64>,
    #[serde(default)]
    pub denied: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub admin_user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct JoinRequestsResponse {
    pub members: Vec<PendingMember>,
}

#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    pub user_id: i64,
}

// -- Posters --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PosterRequest {
    pub user_id: i64,
    pub location: Option<Location>,
}

#[derive(Debug, Serialize)]
pub struct PosterResponse {
    pub poster_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdatesQuery {
    pub user_id: i64,
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct UpdatesResponse {
    pub posters: Vec<PosterDelta>,
}

// -- Elections --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleElectionRequest {
    pub admin_user_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct OutstandingPostersResponse {
    pub posters: Vec<PosterPlacementInfo>,
    pub removal_deadline: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct Empty {}
