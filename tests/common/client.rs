//! HTTP client for end-to-end tests
//!
//! A thin wrapper over reqwest with one method per server endpoint. When a
//! route or request shape changes, update only this file.

use reqwest::Response;
use serde_json::json;
use std::time::Duration;

use super::{REQUEST_TIMEOUT_SECS, TEST_PASS, TEST_USER};

pub struct TestClient {
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client plus a fresh default user, returning the user id.
    ///
    /// # Panics
    ///
    /// Panics if user creation fails (test infrastructure problem).
    pub async fn with_default_user(base_url: String) -> (Self, i64) {
        let client = Self::new(base_url);
        let response = client.create_user(TEST_USER, TEST_PASS).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: serde_json::Value = response.json().await.unwrap();
        let user_id = body["id"].as_i64().unwrap();
        (client, user_id)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/v1/users"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    // ========================================================================
    // Theory
    // ========================================================================

    pub async fn get_scales(&self) -> Response {
        self.client.get(self.url("/v1/theory/scales")).send().await.unwrap()
    }

    pub async fn get_scale(&self, kind: &str, tonic: &str) -> Response {
        self.client
            .get(self.url(&format!("/v1/theory/scales/{}/{}", kind, tonic)))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_scales_by_difficulty(&self) -> Response {
        self.client
            .get(self.url("/v1/theory/scales/difficulty"))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_intervals(&self) -> Response {
        self.client
            .get(self.url("/v1/theory/intervals"))
            .send()
            .await
            .unwrap()
    }

    pub async fn build_interval(&self, start: &str, interval: &str, direction: &str) -> Response {
        self.client
            .post(self.url("/v1/theory/intervals/build"))
            .json(&json!({ "start": start, "interval": interval, "direction": direction }))
            .send()
            .await
            .unwrap()
    }

    pub async fn identify_interval(&self, start: &str, end: &str) -> Response {
        self.client
            .get(self.url("/v1/theory/intervals/identify"))
            .query(&[("start", start), ("end", end)])
            .send()
            .await
            .unwrap()
    }

    pub async fn check_answer(
        &self,
        user_answer: &[&str],
        correct_answer: &[&str],
        order_matters: bool,
    ) -> Response {
        self.client
            .post(self.url("/v1/theory/check"))
            .json(&json!({
                "user_answer": user_answer,
                "correct_answer": correct_answer,
                "order_matters": order_matters,
            }))
            .send()
            .await
            .unwrap()
    }

    // ========================================================================
    // Progress
    // ========================================================================

    pub async fn record_attempt(
        &self,
        user_id: i64,
        category: &str,
        item_name: &str,
        correct: bool,
    ) -> Response {
        self.client
            .post(self.url(&format!("/v1/progress/{}/attempts", user_id)))
            .json(&json!({ "category": category, "item_name": item_name, "correct": correct }))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_progress(&self, user_id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/progress/{}", user_id)))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_category_progress(&self, user_id: i64, category: &str) -> Response {
        self.client
            .get(self.url(&format!("/v1/progress/{}/category/{}", user_id, category)))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_summary(&self, user_id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/progress/{}/summary", user_id)))
            .send()
            .await
            .unwrap()
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    pub async fn append_session(&self, user_id: i64, body: serde_json::Value) -> Response {
        self.client
            .post(self.url(&format!("/v1/sessions/{}", user_id)))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn get_sessions(&self, user_id: i64, category: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(&format!("/v1/sessions/{}", user_id)));
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        request.send().await.unwrap()
    }

    pub async fn get_accuracy(&self, user_id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/sessions/{}/accuracy", user_id)))
            .send()
            .await
            .unwrap()
    }

    // ========================================================================
    // Learning journey
    // ========================================================================

    pub async fn get_journey_steps(&self) -> Response {
        self.client.get(self.url("/v1/journey/steps")).send().await.unwrap()
    }

    pub async fn get_journey(&self, user_id: i64) -> Response {
        self.client
            .get(self.url(&format!("/v1/journey/{}", user_id)))
            .send()
            .await
            .unwrap()
    }

    pub async fn get_step_access(&self, user_id: i64, step_id: u8) -> Response {
        self.client
            .get(self.url(&format!("/v1/journey/{}/steps/{}/access", user_id, step_id)))
            .send()
            .await
            .unwrap()
    }

    pub async fn complete_section(
        &self,
        user_id: i64,
        step_id: u8,
        section: &str,
        score: Option<u32>,
    ) -> Response {
        self.client
            .post(self.url(&format!("/v1/journey/{}/steps/{}/complete", user_id, step_id)))
            .json(&json!({ "section": section, "score": score }))
            .send()
            .await
            .unwrap()
    }
}
