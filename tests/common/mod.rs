//! Shared harness: the real server on a random port, backed by in-memory stores
#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use serde_json::{json, Value};
use userdesk::auth::{AuthService, JwtAuthority, KeyPair, PasswordHasher, TokenAuthority, TokenPolicy};
use userdesk::configuration::CorsSettings;
use userdesk::middleware::TokenCarrier;
use userdesk::repositories::{InMemoryAdminDirectory, InMemoryUserRepository};
use userdesk::startup::run;

pub const PUBLIC_KEY: &str = include_str!("../fixtures/test_pub_key.pem");
pub const PRIVATE_KEY: &str = include_str!("../fixtures/test_private_key.pem");

pub struct TestApp {
    pub address: String,
    pub tokens: Arc<dyn TokenAuthority>,
    pub client: reqwest::Client,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(TokenCarrier::Bearer)
}

pub fn spawn_app_with(carrier: TokenCarrier) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let keys = KeyPair::from_rsa_pem(PUBLIC_KEY.as_bytes(), Some(PRIVATE_KEY.as_bytes()))
        .expect("Failed to load fixture keys");
    let tokens: Arc<dyn TokenAuthority> = Arc::new(JwtAuthority::new(keys, TokenPolicy::default()));
    let auth = AuthService::new(
        Arc::new(InMemoryAdminDirectory::new()),
        tokens.clone(),
        PasswordHasher::default(),
    );

    let server = run(
        listener,
        auth,
        Arc::new(InMemoryUserRepository::new()),
        carrier,
        CorsSettings::default(),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        tokens,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/admin/register",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post_json(
            "/admin/login",
            &json!({ "username": username, "password": password }),
        )
        .await
    }

    /// Registers a fresh admin and returns its access token
    pub async fn access_token(&self) -> String {
        assert_eq!(200, self.register("admin", "password123").await.status().as_u16());
        let body: Value = self.login("admin", "password123").await.json().await.unwrap();
        body["accessToken"].as_str().unwrap().to_string()
    }
}
