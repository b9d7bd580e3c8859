use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use placard_api::claims::TokenService;
use placard_api::{AppStateInner, DEFAULT_REMOVE_RADIUS_M, routes};
use placard_db::Database;

fn app() -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("db"),
        tokens: TokenService::new("http-test-secret", chrono::Duration::hours(48)),
        remove_radius_m: DEFAULT_REMOVE_RADIUS_M,
    });
    routes::router(state)
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request");

    let res = app.clone().oneshot(req).await.expect("response");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn register_and_login(app: &Router, username: &str) -> (i64, String) {
    let (status, _) = call(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "first_name": "First",
            "last_name": "Last",
            "password": "correct horse"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "OK");
    (
        body["user_id"].as_i64().expect("user_id"),
        body["token"].as_str().expect("token").to_string(),
    )
}

#[tokio::test]
async fn protected_routes_need_a_credential() {
    let app = app();
    let (status, body) = call(&app, "GET", "/parties", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "FAILED");

    let (status, _) = call(&app, "GET", "/parties", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn party_join_and_poster_flow() {
    let app = app();
    let (admin, admin_token) = register_and_login(&app, "admin").await;
    let (member, member_token) = register_and_login(&app, "member").await;

    let (status, body) = call(
        &app,
        "POST",
        "/parties",
        Some(&admin_token),
        Some(json!({ "name": "Greens", "user_id": admin })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let party = body["party_id"].as_i64().expect("party_id");
    let admin_token = body["token"].as_str().expect("token").to_string();

    let (status, body) = call(&app, "GET", "/parties", Some(&member_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parties"].as_array().map(Vec::len), Some(1));

    let (status, _) = call(
        &app,
        "POST",
        &format!("/parties/{party}/join"),
        Some(&member_token),
        Some(json!({ "user_id": member })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        "GET",
        &format!("/parties/{party}/join-requests?admin_user_id={admin}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"][0]["user_id"], member);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/parties/{party}/members"),
        Some(&admin_token),
        Some(json!({ "admin_user_id": admin, "approved": [member], "denied": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The admin places and removes a poster
    let spot = json!({ "lat": 53.3498, "lng": -6.2603 });
    let (status, body) = call(
        &app,
        "POST",
        &format!("/parties/{party}/posters"),
        Some(&admin_token),
        Some(json!({ "user_id": admin, "location": spot })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let poster = body["poster_id"].as_i64().expect("poster_id");

    let (status, body) = call(
        &app,
        "POST",
        &format!("/parties/{party}/posters/remove"),
        Some(&admin_token),
        Some(json!({ "user_id": admin, "location": spot })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["poster_id"], poster);

    let (status, body) = call(
        &app,
        "POST",
        &format!("/parties/{party}/posters/remove"),
        Some(&admin_token),
        Some(json!({ "user_id": admin, "location": spot })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "no posters found within 20 meters");

    let (status, body) = call(
        &app,
        "GET",
        &format!("/parties/{party}/stats?user_id={admin}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["placed_count"], 1);
    assert_eq!(body["removed_count"], 1);
    assert_eq!(body["party_name"], "Greens");

    // The member's old credential still names the unaffiliated bucket
    let (status, _) = call(
        &app,
        "POST",
        &format!("/parties/{party}/posters"),
        Some(&member_token),
        Some(json!({ "user_id": member, "location": spot })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
