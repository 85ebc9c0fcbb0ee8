mod common;

use reqwest::header::{AUTHORIZATION, SET_COOKIE};
use serde_json::{json, Value};
use userdesk::middleware::TokenCarrier;

use common::{spawn_app, spawn_app_with};

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/health_check", app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());
}

// --- Registration ---

#[tokio::test]
async fn register_returns_200_for_valid_credentials() {
    let app = spawn_app();

    let response = app.register("admin", "password123").await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Registered");
}

#[tokio::test]
async fn register_returns_400_with_every_issue() {
    let app = spawn_app();

    let response = app.register("ab", "short").await;

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["issues"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["username", "password"]);
}

#[tokio::test]
async fn register_returns_400_for_malformed_json() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/admin/register", app.address))
        .header("Content-Type", "application/json")
        .body("{\"username\": ")
        .send()
        .await
        .unwrap();

    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "CLIENT_ERROR");
}

#[tokio::test]
async fn register_returns_409_for_duplicate_username() {
    let app = spawn_app();
    assert_eq!(200, app.register("admin", "password123").await.status().as_u16());

    let response = app.register("admin", "different123").await;

    assert_eq!(409, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "DUPLICATE_ENTRY");
}

// --- Login ---

#[tokio::test]
async fn login_returns_token_set() {
    let app = spawn_app();
    app.register("admin", "password123").await;

    let response = app.login("admin", "password123").await;

    assert_eq!(200, response.status().as_u16());
    let header = response
        .headers()
        .get(AUTHORIZATION)
        .expect("Bearer carrier echoes the token")
        .to_str()
        .unwrap()
        .to_string();
    let body: Value = response.json().await.unwrap();

    let access_token = body["accessToken"].as_str().unwrap();
    let refresh_token = body["refreshToken"].as_str().unwrap();
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 7200);
    assert_eq!(header, format!("Bearer {}", access_token));

    let claims = app.tokens.decode_access_token(access_token).unwrap();
    assert_eq!(claims.username, "admin");
    assert!(app.tokens.validate_refresh_token(refresh_token));
    assert!(!app.tokens.validate_refresh_token(access_token));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app();
    app.register("admin", "password123").await;

    let wrong_password = app.login("admin", "password999").await;
    let unknown_user = app.login("ghost", "password123").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_user.status().as_u16());

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_user: Value = unknown_user.json().await.unwrap();
    assert_eq!(wrong_password["message"], "invalid username or password");
    assert_eq!(wrong_password["message"], unknown_user["message"]);
    assert_eq!(wrong_password["code"], unknown_user["code"]);
}

#[tokio::test]
async fn login_returns_400_for_missing_fields() {
    let app = spawn_app();

    let response = app.post_json("/admin/login", &json!({})).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn login_sets_cookie_in_cookie_mode() {
    let app = spawn_app_with(TokenCarrier::Cookie {
        name: "access_token".to_string(),
        max_age: 172_800,
    });
    app.register("admin", "password123").await;

    let response = app.login("admin", "password123").await;

    assert_eq!(200, response.status().as_u16());
    assert!(response.headers().get(AUTHORIZATION).is_none());
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .expect("Missing Set-Cookie")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=172800"));

    // The cookie alone authorizes protected routes
    let token = cookie
        .trim_start_matches("access_token=")
        .split(';')
        .next()
        .unwrap();
    let response = app
        .client
        .get(&format!("{}/user", app.address))
        .header("Cookie", format!("access_token={}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
}

// --- Logout ---

#[tokio::test]
async fn logout_requires_token_and_clears_cookie() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/admin/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());

    let token = app.access_token().await;
    let response = app
        .client
        .post(&format!("{}/admin/logout", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(204, response.status().as_u16());
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("access_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}
