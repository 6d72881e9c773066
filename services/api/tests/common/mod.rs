#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use api_lib::adapters::MemorySessionCache;
use api_lib::config::Config;
use api_lib::web::build_router;
use api_lib::web::state::AppState;
use api_lib::{build_state, Stores};
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use dealership_core::domain::{BodyType, Car, FuelType, NewCar, Transmission};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tracing::Level;

pub const ADMIN_SLUG: &str = "test-admin-slug";
pub const PASSWORD: &str = "password123";

/// Build a test `Config` with safe defaults and no database.
pub fn test_config(session_ttl: Duration) -> Config {
    Config {
        bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: None,
        database_max_connections: 1,
        database_acquire_timeout: Duration::from_secs(1),
        log_level: Level::INFO,
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiry: Duration::from_secs(300),
        session_ttl,
        session_sweep_interval: Duration::from_secs(30),
        admin_slug: ADMIN_SLUG.to_string(),
        cors_origin: None,
        default_page_size: 10,
        seed_inventory: false,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

/// Build the full application router over the in-memory store and session cache.
pub fn build_test_app() -> TestApp {
    build_test_app_with_ttl(Duration::from_secs(7200))
}

pub fn build_test_app_with_ttl(session_ttl: Duration) -> TestApp {
    let config = Arc::new(test_config(session_ttl));
    let state = build_state(
        config,
        Stores::memory(),
        MemorySessionCache::new(session_ttl),
    );
    TestApp {
        router: build_router(state.clone()),
        state,
    }
}

pub fn new_car(brand: &str, model: &str, year: i32) -> NewCar {
    NewCar {
        brand: brand.to_string(),
        model: model.to_string(),
        body_type: BodyType::Saloon,
        transmission: Transmission::Automatic,
        price: 20_000.0,
        horse_power: 180,
        fuel_type: FuelType::Petrol,
        mileage: 30_000,
        year,
        img_url: format!("https://img.example/{model}.png"),
    }
}

/// Inserts a car straight into the store.
pub async fn stock_car(app: &TestApp, car: NewCar) -> Car {
    app.state
        .inventory
        .insert_car(car, None)
        .await
        .expect("inserting a car should succeed")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .expect("router should always respond")
}

fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request should build")
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn post_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), None)).await
}

pub async fn put_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, request(Method::PUT, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: &Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

pub async fn send_raw(app: &Router, request: Request<Body>) -> Response<Body> {
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

pub async fn register_user(app: &Router, name: &str, email: &str) {
    let body = serde_json::json!({ "name": name, "email": email, "password": PASSWORD });
    let response = post_json(app, "/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

pub async fn register_staff(app: &Router, name: &str, email: &str, admin: bool) {
    let body = serde_json::json!({
        "name": name,
        "email": email,
        "password": PASSWORD,
        "admin": admin,
    });
    let response = post_json(app, &format!("/admin/register/{ADMIN_SLUG}"), body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

pub async fn login(app: &Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": PASSWORD });
    let response = post_json(app, "/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["token"]
        .as_str()
        .expect("login should return a token")
        .to_string()
}
