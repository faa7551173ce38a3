//! API integration tests against a running server

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn unique_email(tag: &str) -> String {
    format!("{}-{}@uni.test", tag, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

/// Register a fresh student and return its token
async fn register_student(client: &Client, email: &str) -> String {
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "student-pass",
            "full_name": "Integration Student"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse register response");
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_and_login() {
    let client = Client::new();
    let email = unique_email("login");
    register_student(&client, &email).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "student-pass" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["roles"], json!(["Student"]));
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": "nobody@uni.test", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration() {
    let client = Client::new();
    let email = unique_email("dup");
    register_student(&client, &email).await;

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "student-pass",
            "full_name": "Integration Student"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_me() {
    let client = Client::new();
    let email = unique_email("me");
    let token = register_student(&client, &email).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["email"], email);
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/slots/available", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_student_role_limits() {
    let client = Client::new();
    let token = register_student(&client, &unique_email("limits")).await;

    let response = client
        .get(format!("{}/slots/my-slots", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .get(format!("{}/auth/users", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_student_listings() {
    let client = Client::new();
    let token = register_student(&client, &unique_email("lists")).await;

    for path in ["slots/available", "bookings/my-bookings", "notifications", "equipment"] {
        let response = client
            .get(format!("{}/{}", BASE_URL, path))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success(), "GET {} failed", path);
        let body: Value = response.json().await.expect("Failed to parse response");
        assert!(body.is_array());
    }
}

#[tokio::test]
#[ignore]
async fn test_booking_missing_slot() {
    let client = Client::new();
    let token = register_student(&client, &unique_email("missing")).await;

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "slot_id": i32::MAX,
            "start_time": "2030-01-01T09:00:00Z",
            "end_time": "2030-01-01T09:30:00Z"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
