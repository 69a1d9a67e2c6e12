//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with cookie-based session handling and one method per
//! server endpoint. When API routes or request formats change, update
//! only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows. For most tests, use
    /// `authenticated()` or `authenticated_admin()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the regular test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(TEST_EMAIL, TEST_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Test user authentication failed: {:?}",
            response.text().await
        );

        client
    }

    /// Creates a client pre-authenticated as the admin test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_admin(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(ADMIN_EMAIL, ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Admin authentication failed: {:?}",
            response.text().await
        );

        client
    }

    /// GET an arbitrary path (including query string) under the base URL
    pub async fn get_path(&self, path_and_query: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path_and_query))
            .send()
            .await
            .expect("GET request failed")
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/register
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/register", self.base_url))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Register request failed")
    }

    /// POST /v1/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/v1/auth/login", self.base_url))
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(format!("{}/v1/auth/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /v1/user/me
    pub async fn me(&self) -> Response {
        self.get_path("/v1/user/me").await
    }

    /// GET /v1/user/profile
    pub async fn get_profile(&self) -> Response {
        self.get_path("/v1/user/profile").await
    }

    /// PUT /v1/user/profile
    pub async fn put_profile(&self, body: &serde_json::Value) -> Response {
        self.client
            .put(format!("{}/v1/user/profile", self.base_url))
            .json(body)
            .send()
            .await
            .expect("Profile update failed")
    }

    /// GET /v1/user/detail
    pub async fn get_detail(&self) -> Response {
        self.get_path("/v1/user/detail").await
    }

    /// PUT /v1/user/detail
    pub async fn put_detail(&self, body: &serde_json::Value) -> Response {
        self.client
            .put(format!("{}/v1/user/detail", self.base_url))
            .json(body)
            .send()
            .await
            .expect("Account update failed")
    }

    // ========================================================================
    // Store Endpoints
    // ========================================================================

    /// GET /v1/artists/{id}
    pub async fn get_artist(&self, id: i64) -> Response {
        self.get_path(&format!("/v1/artists/{}", id)).await
    }

    /// GET /v1/albums/{id}
    pub async fn get_album(&self, id: i64) -> Response {
        self.get_path(&format!("/v1/albums/{}", id)).await
    }

    /// GET /v1/tracks/{id}
    pub async fn get_track(&self, id: i64) -> Response {
        self.get_path(&format!("/v1/tracks/{}", id)).await
    }

    /// GET /v1/customers/{id}
    pub async fn get_customer(&self, id: i64) -> Response {
        self.get_path(&format!("/v1/customers/{}", id)).await
    }

    /// GET /v1/invoices/{id}
    pub async fn get_invoice(&self, id: i64) -> Response {
        self.get_path(&format!("/v1/invoices/{}", id)).await
    }
}
