// ABOUTME: Shared test utilities: in-memory server setup, users, and request driving
// ABOUTME: Tests exercise the full router via tower::ServiceExt::oneshot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tipple
#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::{Arc, Once};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::util::ServiceExt;

use tipple_server::app;
use tipple_server::auth::{hash_password, AuthManager};
use tipple_server::config::ServerConfig;
use tipple_server::database::Database;
use tipple_server::models::{User, UserRole};
use tipple_server::resources::ServerResources;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Build a full server against an in-memory database
pub async fn setup() -> (Router, Arc<ServerResources>) {
    init_test_logging();
    let database = Database::connect("sqlite::memory:").await.unwrap();
    let config = ServerConfig {
        http_port: 0,
        database_url: "sqlite::memory:".into(),
        jwt_secret: "test-secret".into(),
        jwt_secret_generated: false,
        jwt_expiry_hours: 24,
        log_level: "warn".into(),
    };
    let auth = AuthManager::new(config.jwt_secret.clone(), config.jwt_expiry_hours);
    let resources = Arc::new(ServerResources::new(database, auth, config));
    (app(resources.clone()), resources)
}

/// Register a user directly through the managers and mint a token
pub async fn register_user(resources: &Arc<ServerResources>, username: &str) -> (User, String) {
    let user = User::new(
        username.to_owned(),
        format!("{username}@example.com"),
        hash_password("hunter2!").unwrap(),
        None,
    );
    resources.database.users().create(&user).await.unwrap();
    let token = resources.auth.generate_token(&user).unwrap();
    (user, token)
}

/// Register an admin and mint a token carrying the admin role
pub async fn register_admin(resources: &Arc<ServerResources>, username: &str) -> (User, String) {
    let (mut user, _) = register_user(resources, username).await;
    sqlx::query("UPDATE users SET role = 'admin' WHERE key = ?")
        .bind(user.key.to_string())
        .execute(resources.database.pool())
        .await
        .unwrap();
    user.role = UserRole::Admin;
    let token = resources.auth.generate_token(&user).unwrap();
    (user, token)
}

/// Drive one request through the router, returning status and parsed body
pub async fn request(
    router: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = if let Some(body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// POST an ingredient, returning its public id
pub async fn create_ingredient(
    router: &Router,
    token: &str,
    name: &str,
    kind: &str,
    abv: f64,
) -> String {
    let (status, body) = request(
        router,
        "POST",
        "/ingredients",
        Some(token),
        Some(serde_json::json!({ "name": name, "type": kind, "abv": abv })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "ingredient create: {body}");
    body["id"].as_str().unwrap().to_owned()
}

/// POST a recipe from (ingredient id, qty, unit) lines, returning the body
pub async fn create_recipe(
    router: &Router,
    token: &str,
    name: &str,
    method: &str,
    lines: &[(&str, f64, &str)],
) -> Value {
    let ingredients: Vec<Value> = lines
        .iter()
        .map(|(id, qty, unit)| serde_json::json!({ "id": id, "quantity": qty, "unit": unit }))
        .collect();
    let (status, body) = request(
        router,
        "POST",
        "/recipes",
        Some(token),
        Some(serde_json::json!({
            "name": name,
            "method": method,
            "instructions": "Combine and serve.",
            "ingredients": ingredients,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "recipe create: {body}");
    body
}
