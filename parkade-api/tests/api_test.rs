use std::sync::Arc;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use parkade_allocation::AllocationEngine;
use parkade_api::{
    app,
    middleware::AdminClaims,
    state::{AppState, AuthConfig},
};
use parkade_core::{Admin, AdminRepository, EngineSettings, FeePolicy};
use parkade_store::{InMemoryAdminRepository, InMemorySlotRepository, InMemoryTicketRepository};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "test-secret";

async fn test_app() -> Router {
    let admins = Arc::new(InMemoryAdminRepository::new());
    admins
        .save_admin(&Admin {
            id: "admin-1".to_string(),
            username: "admin".to_string(),
            password_hash: bcrypt::hash("hunter2", 4).unwrap(),
        })
        .await
        .unwrap();

    let engine = AllocationEngine::new(
        Arc::new(InMemorySlotRepository::new()),
        Arc::new(InMemoryTicketRepository::new()),
        FeePolicy::default(),
        EngineSettings::default(),
    );

    app(AppState {
        engine,
        admins,
        rate_limit: None,
        auth: AuthConfig { secret: SECRET.to_string(), expiration: 3600 },
    })
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
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
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_parking_routes_require_admin_token() {
    let app = test_app().await;

    let (status, _) = send(&app, "GET", "/v1/slots/available", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/slots/available", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let guest = AdminClaims {
        sub: "guest".to_string(),
        username: "guest".to_string(),
        role: "GUEST".to_string(),
        exp: (Utc::now().timestamp() + 600) as usize,
    };
    let token = encode(&Header::default(), &guest, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    let (status, _) = send(&app, "GET", "/v1/slots/available", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_park_and_unpark_flow() {
    let app = test_app().await;
    let token = login(&app).await;

    let (status, slot) = send(&app, "POST", "/v1/slots", Some(&token), Some(json!({ "id": 7, "resource_type": "car" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(slot, json!({ "id": 7, "resource_type": "car", "occupied": false }));

    let (status, free) = send(&app, "GET", "/v1/slots/available", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(free.as_array().unwrap().len(), 1);

    let park = json!({ "vehicle_id": "KA01AB1234", "resource_type": "car" });
    let (status, ticket) = send(&app, "POST", "/v1/parking/park", Some(&token), Some(park.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["slot_id"], 7);
    assert_eq!(ticket["vehicle_id"], "KA01AB1234");

    let (status, body) = send(&app, "POST", "/v1/parking/park", Some(&token), Some(park)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("KA01AB1234"));

    let (_, free) = send(&app, "GET", "/v1/slots/available", Some(&token), None).await;
    assert!(free.as_array().unwrap().is_empty());

    let unpark = json!({ "vehicle_id": "KA01AB1234" });
    let (status, body) = send(&app, "POST", "/v1/parking/unpark", Some(&token), Some(unpark.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicle_id"], "KA01AB1234");
    assert_eq!(body["fee"].as_f64(), Some(0.0));

    let (status, _) = send(&app, "POST", "/v1/parking/unpark", Some(&token), Some(unpark)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_park_without_capacity_is_conflict() {
    let app = test_app().await;
    let token = login(&app).await;

    send(&app, "POST", "/v1/slots", Some(&token), Some(json!({ "id": 1, "resource_type": "bike" }))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/v1/parking/park",
        Some(&token),
        Some(json!({ "vehicle_id": "KA01AB1234", "resource_type": "car" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "No free car slot available");
}

#[tokio::test]
async fn test_duplicate_slot_is_conflict() {
    let app = test_app().await;
    let token = login(&app).await;

    let slot = json!({ "id": 3, "resource_type": "bike" });
    let (status, _) = send(&app, "POST", "/v1/slots", Some(&token), Some(slot.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/v1/slots", Some(&token), Some(slot)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_park_requests() {
    let app = test_app().await;
    let token = login(&app).await;
    send(&app, "POST", "/v1/slots", Some(&token), Some(json!({ "id": 1, "resource_type": "car" }))).await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/parking/park",
        Some(&token),
        Some(json!({ "vehicle_id": "   ", "resource_type": "car" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/v1/parking/park",
        Some(&token),
        Some(json!({ "vehicle_id": "KA01AB1234", "resource_type": "truck" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
