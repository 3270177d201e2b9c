use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use parkwise_api::{app, state::{AppState, AuthConfig}};
use parkwise_core::model::{NewUser, Role};
use parkwise_store::DbClient;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    let db = DbClient::in_memory().await.unwrap();
    db.migrate().await.unwrap();

    let state = AppState::new(
        &db,
        AuthConfig { secret: "test-secret".to_string(), expiration: 3600 },
    );
    state
        .users
        .ensure_admin(&NewUser {
            username: "Admin".into(),
            email: "admin@parking.com".into(),
            password: "admin123".into(),
            role: Role::Admin,
        })
        .await
        .unwrap();

    app(state)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn register_and_login(app: &Router, email: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({ "username": "Meera", "email": email, "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    login(app, email, "pw123").await
}

async fn create_lot(app: &Router, admin: &str, name: &str, spots: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/admin/lots",
        Some(admin),
        Some(json!({
            "name": name,
            "address": "4 Brigade Road",
            "pin_code": "560025",
            "price": 20.0,
            "max_spots": spots
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create lot failed: {}", body);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn test_register_and_login() {
    let app = test_app().await;

    let (status, user) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({ "username": "Meera", "email": "meera@example.com", "password": "pw123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "user");
    assert!(user.get("password").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({ "username": "Other", "email": "meera@example.com", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "email already registered");

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": "meera@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": "admin@parking.com", "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_role_guards() {
    let app = test_app().await;
    let admin = login(&app, "admin@parking.com", "admin123").await;
    let user = register_and_login(&app, "meera@example.com").await;

    let (status, _) = send(&app, Method::GET, "/v1/admin/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/v1/admin/dashboard", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/v1/admin/dashboard", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/v1/user/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/v1/admin/dashboard", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_booking_lifecycle() {
    let app = test_app().await;
    let admin = login(&app, "admin@parking.com", "admin123").await;
    let user = register_and_login(&app, "meera@example.com").await;
    let lot_id = create_lot(&app, &admin, "Brigade", 1).await;

    let (status, booking) = send(
        &app,
        Method::POST,
        "/v1/user/bookings",
        Some(&user),
        Some(json!({ "lot_id": lot_id, "vehicle_number": "KA05MN0001" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(booking["end_time"].is_null());
    let booking_id = booking["id"].as_i64().unwrap();
    let spot_id = booking["spot_id"].as_i64().unwrap();

    // Lot is now full.
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/user/bookings",
        Some(&user),
        Some(json!({ "lot_id": lot_id, "vehicle_number": "KA05MN0002" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "No available spots in the selected lot");

    let (status, spot) = send(&app, Method::GET, &format!("/v1/admin/spots/{}", spot_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spot["spot"]["status"], "Occupied");
    assert_eq!(spot["active_booking"]["id"], booking_id);

    let (status, _) = send(&app, Method::DELETE, &format!("/v1/admin/lots/{}", lot_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, count) = send(&app, Method::GET, "/v1/admin/lots/by-name/Brigade/occupied", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count["occupied"], 1);

    let (status, receipt) = send(
        &app,
        Method::POST,
        &format!("/v1/user/bookings/{}/release", booking_id),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["booking_id"], booking_id);
    assert!(receipt["total_cost"].as_f64().unwrap() >= 0.0);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/user/bookings/{}/release", booking_id),
        Some(&user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, bookings) = send(&app, Method::GET, "/v1/user/bookings", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!bookings[0]["end_time"].is_null());

    let (status, _) = send(&app, Method::DELETE, &format!("/v1/admin/lots/{}", lot_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/v1/admin/lots/{}", lot_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cannot_release_someone_elses_booking() {
    let app = test_app().await;
    let admin = login(&app, "admin@parking.com", "admin123").await;
    let owner = register_and_login(&app, "owner@example.com").await;
    let other = register_and_login(&app, "other@example.com").await;
    let lot_id = create_lot(&app, &admin, "Brigade", 2).await;

    let (_, booking) = send(
        &app,
        Method::POST,
        "/v1/user/bookings",
        Some(&owner),
        Some(json!({ "lot_id": lot_id, "vehicle_number": "KA01" })),
    )
    .await;
    let booking_id = booking["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/v1/user/bookings/{}/release", booking_id),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::POST, "/v1/user/bookings/9999/release", Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_lot_management() {
    let app = test_app().await;
    let admin = login(&app, "admin@parking.com", "admin123").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/admin/lots",
        Some(&admin),
        Some(json!({ "name": "", "address": "x", "pin_code": "1", "price": 5.0, "max_spots": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "lot name is required");

    let lot_id = create_lot(&app, &admin, "Koramangala", 3).await;

    let (status, spots) = send(&app, Method::GET, &format!("/v1/admin/lots/{}/spots", lot_id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(spots.as_array().unwrap().len(), 3);

    let (status, lot) = send(
        &app,
        Method::PUT,
        &format!("/v1/admin/lots/{}", lot_id),
        Some(&admin),
        Some(json!({ "price": 35.5, "max_spots": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lot["price"], 35.5);
    assert_eq!(lot["name"], "Koramangala");

    let (_, spots) = send(&app, Method::GET, &format!("/v1/admin/lots/{}/spots", lot_id), Some(&admin), None).await;
    assert_eq!(spots.as_array().unwrap().len(), 5);

    let (status, lots) = send(&app, Method::GET, "/v1/admin/lots", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lots.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/v1/admin/lots/77/spots", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboards_and_summaries() {
    let app = test_app().await;
    let admin = login(&app, "admin@parking.com", "admin123").await;
    let user = register_and_login(&app, "meera@example.com").await;
    let brigade = create_lot(&app, &admin, "Brigade", 2).await;
    create_lot(&app, &admin, "Airport", 1).await;

    send(
        &app,
        Method::POST,
        "/v1/user/bookings",
        Some(&user),
        Some(json!({ "lot_id": brigade, "vehicle_number": "KA01" })),
    )
    .await;

    let (status, dash) = send(&app, Method::GET, "/v1/user/dashboard", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["lots"].as_array().unwrap().len(), 2);
    assert_eq!(dash["lots"][0]["available"], 1);
    assert_eq!(dash["bookings"].as_array().unwrap().len(), 1);

    let (status, found) = send(&app, Method::GET, "/v1/user/lots?q=airport", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Airport");

    let (status, summary) = send(&app, Method::GET, "/v1/admin/summary", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["user_count"], 1);
    assert_eq!(summary["lot_usage"][0]["occupied"], 1);
    assert_eq!(summary["monthly_bookings"][0]["count"], 1);
    assert_eq!(summary["daily_bookings"].as_array().unwrap().len(), 1);

    let (status, mine) = send(&app, Method::GET, "/v1/user/summary", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine[0]["lot_id"], brigade);
    assert_eq!(mine[0]["lot_name"], "Brigade");
    assert_eq!(mine[0]["bookings"], 1);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let app = test_app().await;
    let admin = login(&app, "admin@parking.com", "admin123").await;

    let (status, body) = send(&app, Method::POST, "/v1/admin/lots", Some(&admin), Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("address"), "unexpected body: {}", body);

    let (status, body) = send(&app, Method::POST, "/v1/auth/login", None, Some(json!({ "email": 7 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, Method::GET, "/v1/admin/lots/abc", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
