/// Common test utilities for integration tests
///
/// Every context gets its own in-memory store, so tests never share rows and
/// need no external services.
///
/// - App construction over a [`MemoryStore`] with injectable write failures
/// - Account creation through the public signup endpoint
/// - Request helpers returning status and parsed JSON body

use assignpay_api::app::{build_router, AppState};
use assignpay_api::config::Config;
use assignpay_shared::store::memory::MemoryStore;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TEST_PASSWORD: &str = "essay-deadline-2025";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub app: axum::Router,
}

/// A signed-up account
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestUser {
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl TestContext {
    /// Creates a context with default configuration
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Creates a context with extra configuration variables
    pub fn with_env(pairs: &[(&str, &str)]) -> Self {
        let mut vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert("JWT_SECRET".to_string(), TEST_SECRET.to_string());

        let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store.clone(), store.clone());
        let app = build_router(state.clone());

        Self { store, state, app }
    }

    /// Sends a request and returns the status with the parsed body
    ///
    /// Empty bodies parse to `Value::Null`.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, json)
    }

    /// Signs up a fresh account with the given display name
    pub async fn signup(&self, full_name: &str) -> TestUser {
        let email = format!("student-{}@example.com", Uuid::new_v4());
        let (status, body) = self
            .request(
                "POST",
                "/v1/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "full_name": full_name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

        TestUser {
            id: body["session"]["user_id"].as_str().unwrap().parse().unwrap(),
            email,
            access_token: body["access_token"].as_str().unwrap().to_string(),
            refresh_token: body["refresh_token"].as_str().unwrap().to_string(),
        }
    }
}

/// A request body that passes validation with a credit card
pub fn complete_submission(title: &str) -> Value {
    json!({
        "title": title,
        "file": { "name": "essay.pdf", "size": 48213, "content_type": "application/pdf" },
        "payment": {
            "method": "credit_card",
            "card_number": "4242424242424242",
            "expiry": "12/30",
            "cvc": "123"
        }
    })
}
