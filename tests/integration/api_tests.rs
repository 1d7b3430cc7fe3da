//! API integration tests
//!
//! These run against a live server with an admin profile that has a password:
//! set TEST_ADMIN_EMAIL / TEST_ADMIN_PASSWORD (defaults below).

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

fn admin_credentials() -> (String, String) {
    (
        std::env::var("TEST_ADMIN_EMAIL").unwrap_or_else(|_| "admin@cut.ac.zw".to_string()),
        std::env::var("TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin-password".to_string()),
    )
}

/// Unique suffix so reruns do not collide on codes and emails
fn unique() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}

fn timestamp(value: &Value) -> chrono::DateTime<chrono::FixedOffset> {
    chrono::DateTime::parse_from_rfc3339(value.as_str().expect("timestamp string"))
        .expect("RFC 3339 timestamp")
}

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let (email, password) = admin_credentials();
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
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
async fn test_login() {
    let client = Client::new();
    let (email, password) = admin_credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["profile"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _) = admin_credentials();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/assets", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_logout_revokes_token() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .post(format!("{}/auth/logout", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_navigation_for_admin() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/navigation", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["dashboard"], "admin_overview");
    let titles: Vec<&str> = body["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|i| i["title"].as_str())
        .collect();
    assert!(titles.contains(&"Audit Log"));
}

#[tokio::test]
#[ignore]
async fn test_duplicate_asset_code_is_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = format!("CUT-LAP-{}", unique());

    let asset = json!({
        "asset_code": code,
        "name": "ThinkPad T14",
        "category": "laptop"
    });

    let response = client
        .post(format!("{}/assets", BASE_URL))
        .bearer_auth(&token)
        .json(&asset)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // Same code in lower case
    let response = client
        .post(format!("{}/assets", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "asset_code": code.to_lowercase(),
            "name": "Another laptop",
            "category": "laptop"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["field"], "asset_code");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_registrations_of_one_code() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let code = format!("CUT-CAM-{}", unique());

    let register = |name: &'static str| {
        client
            .post(format!("{}/assets", BASE_URL))
            .bearer_auth(&token)
            .json(&json!({
                "asset_code": code,
                "name": name,
                "category": "camera"
            }))
            .send()
    };

    let (first, second) = tokio::join!(register("Canon EOS R50"), register("Nikon Z30"));
    let first = first.expect("Failed to send request");
    let second = second.expect("Failed to send request");

    let mut statuses = vec![first.status().as_u16(), second.status().as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![201, 409]);

    let rejected = if first.status() == 409 { first } else { second };
    let body: Value = rejected.json().await.expect("Failed to parse response");
    assert_eq!(body["field"], "asset_code");

    let response = client
        .get(format!("{}/assets/by-code/{}", BASE_URL, code))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_issue_scan_and_return() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let suffix = unique();

    // Asset
    let response = client
        .post(format!("{}/assets", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "asset_code": format!("CUT-PROJ-{}", suffix),
            "name": "Epson EB-X41",
            "category": "projector"
        }))
        .send()
        .await
        .expect("Failed to create asset");
    assert_eq!(response.status(), 201);
    let asset: Value = response.json().await.expect("asset");
    assert_eq!(asset["status"], "available");
    let asset_id = asset["id"].as_str().expect("asset id").to_string();
    let asset_code = asset["asset_code"].as_str().expect("asset code").to_string();

    // Recipient
    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "email": format!("staff.{}@cut.ac.zw", suffix.to_lowercase()),
            "full_name": "Test Staff",
            "role": "staff"
        }))
        .send()
        .await
        .expect("Failed to create profile");
    assert_eq!(response.status(), 201);
    let profile: Value = response.json().await.expect("profile");

    // Issue for a week
    let response = client
        .post(format!("{}/issues", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "asset_id": asset_id,
            "issued_to": profile["id"],
            "preset": "7d"
        }))
        .send()
        .await
        .expect("Failed to issue");
    assert_eq!(response.status(), 201);
    let issue: Value = response.json().await.expect("issue");
    assert_eq!(issue["status"], "active");
    assert_eq!(issue["is_overdue"], false);

    // Issuing again is refused
    let response = client
        .post(format!("{}/issues", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "asset_id": asset_id,
            "issued_to": profile["id"],
            "preset": "7d"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Scan by lower-case code
    let response = client
        .get(format!("{}/scan/{}", BASE_URL, asset_code.to_lowercase()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to scan");
    assert!(response.status().is_success());
    let scan: Value = response.json().await.expect("scan");
    assert_eq!(scan["asset"]["status"], "issued");
    assert_eq!(scan["current_issue"]["id"], issue["id"]);

    // Return
    let response = client
        .post(format!("{}/issues/{}/return", BASE_URL, issue["id"].as_str().expect("issue id")))
        .bearer_auth(&token)
        .json(&json!({ "return_condition": "good" }))
        .send()
        .await
        .expect("Failed to return");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("returned");
    assert_eq!(returned["status"], "returned");
    assert_eq!(returned["asset"]["status"], "available");
    assert_eq!(returned["asset"]["condition"], "good");
    assert!(timestamp(&returned["actual_return_date"]) >= timestamp(&issue["issue_date"]));

    // A second return is refused
    let response = client
        .post(format!("{}/issues/{}/return", BASE_URL, issue["id"].as_str().expect("issue id")))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}
