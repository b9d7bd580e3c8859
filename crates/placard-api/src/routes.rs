use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;

use placard_types::api::{
    AdminQuery, ApproveMembersRequest, CreatePartyRequest, CreatePartyResponse, Empty,
    JoinPartyRequest, JoinRequestsResponse, LoginRequest, MemberQuery, OutstandingPostersResponse,
    PartiesResponse, PosterRequest, PosterResponse, RegisterRequest, RegisterResponse, Reply,
    ScheduleElectionRequest, UpdatesQuery, UpdatesResponse,
};
use placard_types::models::Claims;

use crate::error::ApiResult;
use crate::middleware::require_auth;
use crate::{AppState, accounts, blocking, elections, join_requests, parties, posters};

/// Every route of the service. Everything but registration, login and the
/// health probe sits behind `require_auth`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/parties", get(list_parties).post(create_party))
        .route("/parties/{party_id}/join", post(join_party))
        .route("/parties/{party_id}/join-requests", get(pending_join_requests))
        .route("/parties/{party_id}/members", post(approve_members))
        .route("/parties/{party_id}/posters", post(place_poster))
        .route("/parties/{party_id}/posters/remove", post(remove_poster))
        .route("/parties/{party_id}/posters/updates", get(poster_updates))
        .route("/parties/{party_id}/election", put(schedule_election))
        .route("/parties/{party_id}/election/outstanding", get(outstanding_posters))
        .route("/parties/{party_id}/stats", get(profile_stats))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// -- Accounts --

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user_id = blocking(&state, move |s| accounts::register(&s.db, &req)).await?;
    Ok((StatusCode::CREATED, Json(Reply::ok(RegisterResponse { user_id }))))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let res = blocking(&state, move |s| accounts::login(&s.db, &s.tokens, &req)).await?;
    Ok(Json(Reply::ok(res)))
}

// -- Parties --

async fn list_parties(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let parties = blocking(&state, |s| parties::list_parties(&s.db)).await?;
    Ok(Json(Reply::ok(PartiesResponse { parties })))
}

async fn create_party(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePartyRequest>,
) -> ApiResult<impl IntoResponse> {
    let created = blocking(&state, move |s| {
        parties::create_party(&s.db, &s.tokens, &claims, &req.name, req.user_id)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(Reply::ok(CreatePartyResponse {
            party_id: created.party_id,
            token: created.token,
        })),
    ))
}

async fn profile_stats(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Query(query): Query<MemberQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let stats = blocking(&state, move |s| {
        parties::membership_stats(&s.db, &claims, query.user_id, party_id)
    })
    .await?;
    Ok(Json(Reply::ok(stats)))
}

// -- Join requests --

async fn join_party(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<JoinPartyRequest>,
) -> ApiResult<impl IntoResponse> {
    blocking(&state, move |s| {
        join_requests::join_party(&s.db, &claims, req.user_id, party_id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(Reply::ok(Empty {}))))
}

async fn pending_join_requests(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Query(query): Query<AdminQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let members = blocking(&state, move |s| {
        join_requests::pending_members(&s.db, &claims, party_id, query.admin_user_id)
    })
    .await?;
    Ok(Json(Reply::ok(JoinRequestsResponse { members })))
}

async fn approve_members(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApproveMembersRequest>,
) -> ApiResult<impl IntoResponse> {
    blocking(&state, move |s| {
        join_requests::approve_members(
            &s.db,
            &claims,
            party_id,
            req.admin_user_id,
            &req.approved,
            &req.denied,
        )
    })
    .await?;
    Ok(Json(Reply::ok(Empty {})))
}

// -- Posters --

async fn place_poster(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PosterRequest>,
) -> ApiResult<impl IntoResponse> {
    let poster_id = blocking(&state, move |s| {
        posters::place(&s.db, &claims, party_id, req.user_id, req.location)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(Reply::ok(PosterResponse { poster_id }))))
}

async fn remove_poster(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PosterRequest>,
) -> ApiResult<impl IntoResponse> {
    let poster_id = blocking(&state, move |s| {
        posters::remove(&s.db, &claims, s.remove_radius_m, party_id, req.user_id, req.location)
    })
    .await?;
    Ok(Json(Reply::ok(PosterResponse { poster_id })))
}

async fn poster_updates(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Query(query): Query<UpdatesQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let posters = blocking(&state, move |s| {
        posters::updates(&s.db, &claims, party_id, query.user_id, query.since)
    })
    .await?;
    Ok(Json(Reply::ok(UpdatesResponse { posters })))
}

// -- Elections --

async fn schedule_election(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ScheduleElectionRequest>,
) -> ApiResult<impl IntoResponse> {
    blocking(&state, move |s| {
        elections::schedule(
            &s.db,
            &claims,
            party_id,
            req.admin_user_id,
            req.start_date,
            req.end_date,
            Utc::now(),
        )
    })
    .await?;
    Ok(Json(Reply::ok(Empty {})))
}

async fn outstanding_posters(
    State(state): State<AppState>,
    Path(party_id): Path<i64>,
    Query(query): Query<MemberQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let (posters, removal_deadline) = blocking(&state, move |s| {
        elections::outstanding_posters(&s.db, &claims, party_id, query.user_id)
    })
    .await?;
    Ok(Json(Reply::ok(OutstandingPostersResponse {
        posters,
        removal_deadline,
    })))
}
