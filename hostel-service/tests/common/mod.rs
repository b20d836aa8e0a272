#![allow(dead_code)]

use hostel_service::config::HostelConfig;
use hostel_service::services::HostelStore;
use hostel_service::startup::Application;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use std::sync::Arc;

pub const ADMIN_ID: &str = "admin-1";
pub const OWNER_ID: &str = "owner-1";
pub const OTHER_OWNER_ID: &str = "owner-2";
pub const MANAGER_ID: &str = "manager-1";

/// Identity forwarded by the gateway.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub role: &'static str,
    pub hostel_id: Option<String>,
}

impl Caller {
    pub fn admin() -> Self {
        Self {
            user_id: ADMIN_ID.to_string(),
            role: "ADMIN",
            hostel_id: None,
        }
    }

    pub fn owner(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            role: "OWNER",
            hostel_id: None,
        }
    }

    pub fn manager(hostel_id: &str) -> Self {
        Self {
            user_id: MANAGER_ID.to_string(),
            role: "MANAGER",
            hostel_id: Some(hostel_id.to_string()),
        }
    }

    pub fn student(user_id: &str, hostel_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            role: "STUDENT",
            hostel_id: Some(hostel_id.to_string()),
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<dyn HostelStore>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(HostelConfig::in_memory()).await
    }

    pub async fn spawn_with(config: HostelConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let store = app.store();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
            client,
        }
    }

    pub fn request(&self, method: Method, path: &str, caller: &Caller) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}/api/v1{}", self.address, path))
            .header("X-User-ID", &caller.user_id)
            .header("X-User-Role", caller.role);
        if let Some(ref hostel_id) = caller.hostel_id {
            builder = builder.header("X-Hostel-ID", hostel_id);
        }
        builder
    }

    pub async fn get(&self, path: &str, caller: &Caller) -> Response {
        self.request(Method::GET, path, caller)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, caller: &Caller, body: Value) -> Response {
        self.request(Method::POST, path, caller)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, caller: &Caller, body: Value) -> Response {
        self.request(Method::PATCH, path, caller)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str, caller: &Caller) -> Response {
        self.request(Method::DELETE, path, caller)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a hostel owned by `owner_id` and returns its id.
    pub async fn create_hostel(&self, owner_id: &str, name: &str) -> String {
        let response = self
            .post(
                "/hostels",
                &Caller::owner(owner_id),
                json!({
                    "name": name,
                    "address": "12 College Road",
                    "city": "Kampala",
                }),
            )
            .await;
        assert_eq!(response.status(), 201, "hostel creation failed");
        let body: Value = response.json().await.expect("Invalid hostel response");
        body["id"].as_str().expect("hostel id").to_string()
    }

    pub async fn create_room(&self, hostel_id: &str, number: &str, capacity: i32) -> String {
        let response = self
            .post(
                &format!("/hostels/{}/rooms", hostel_id),
                &Caller::manager(hostel_id),
                json!({
                    "number": number,
                    "floor": 1,
                    "room_type": "DORMITORY",
                    "capacity": capacity,
                }),
            )
            .await;
        assert_eq!(response.status(), 201, "room creation failed");
        let body: Value = response.json().await.expect("Invalid room response");
        body["id"].as_str().expect("room id").to_string()
    }

    /// Registers a student with the given fee. `user_id` links a student login.
    pub async fn create_student(
        &self,
        hostel_id: &str,
        name: &str,
        monthly_fee: i64,
        user_id: Option<&str>,
    ) -> String {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        let response = self
            .post(
                &format!("/hostels/{}/students", hostel_id),
                &Caller::manager(hostel_id),
                json!({
                    "name": name,
                    "email": email,
                    "monthly_fee": monthly_fee,
                    "user_id": user_id,
                }),
            )
            .await;
        assert_eq!(response.status(), 201, "student creation failed");
        let body: Value = response.json().await.expect("Invalid student response");
        body["id"].as_str().expect("student id").to_string()
    }

    pub async fn generate(&self, hostel_id: &str, month: i32, year: i32) -> Response {
        self.post(
            &format!("/hostels/{}/payments/generate", hostel_id),
            &Caller::manager(hostel_id),
            json!({ "month": month, "year": year }),
        )
        .await
    }

    pub async fn list_payments(&self, hostel_id: &str, query: &str) -> Value {
        let response = self
            .get(
                &format!("/hostels/{}/payments{}", hostel_id, query),
                &Caller::manager(hostel_id),
            )
            .await;
        assert_eq!(response.status(), 200);
        response.json().await.expect("Invalid payment list")
    }
}
