use axum::http::Method;
use axum::Router;

use super::app::TEST_PASSWORD;
use super::http::{request, response_json};

pub fn auth_header(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn login(app: &Router, username: &str) -> String {
    let response = request(
        app,
        Method::POST,
        "/api/auth/login",
        Some(serde_json::json!({
            "username": username,
            "password": TEST_PASSWORD,
        })),
        &[],
    )
    .await;

    let (status, _, body) = response_json(response).await;
    assert!(status.is_success(), "login failed for {username}: {body}");
    body["data"]["accessToken"]
        .as_str()
        .expect("accessToken in login response")
        .to_string()
}
