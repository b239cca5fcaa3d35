use wiremock::{matchers::path, Mock, ResponseTemplate};

use crate::helpers::{LoginResponse, TestApp, TEST_PASSWORD};

#[actix_web::test]
async fn login_with_correct_data_returns_token(){
    let app = TestApp::spawn_app().await;

    let token = app.create_user_and_login("jeanne.martin@example.com").await;

    assert!(!token.is_empty());
    let profile = app.get_as(Some(&token), "/user/profile").await;
    assert_eq!(profile.status().as_u16(), 200);
}

#[actix_web::test]
async fn login_with_wrong_password_returns_401(){
    let app = TestApp::spawn_app().await;
    app.create_user_and_login("jeanne.martin@example.com").await;

    let response = app.post_login("jeanne.martin@example.com", "wrongpassword").await;

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Email or password is incorrect");
}

#[actix_web::test]
async fn login_with_unknown_email_returns_401(){
    let app = TestApp::spawn_app().await;

    let response = app.post_login("nobody@example.com", TEST_PASSWORD).await;

    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn login_before_confirmation_returns_401(){
    let app = TestApp::spawn_app().await;

    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_api)
        .await;
    app.post_registration("jeanne.martin@example.com", "Jeanne").await;

    let response = app.post_login("jeanne.martin@example.com", TEST_PASSWORD).await;

    assert_eq!(response.status().as_u16(), 401);
    assert!(response.json::<LoginResponse>().await.is_err());
}

#[actix_web::test]
async fn invalid_token_is_rejected(){
    let app = TestApp::spawn_app().await;

    let response = app.get_as(Some("not.a.token"), "/user/profile").await;

    assert_eq!(response.status().as_u16(), 401);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid token");
}

#[actix_web::test]
async fn missing_token_returns_json_401(){
    let app = TestApp::spawn_app().await;

    let response = app.get_as(None, "/user/profile").await;

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing token");
}

#[actix_web::test]
async fn token_without_bearer_separator_is_rejected(){
    let app = TestApp::spawn_app().await;
    let token = app.create_user_and_login("jeanne.martin@example.com").await;

    let response = app.api_client.get(app.url("/user/profile"))
        .header("Authorization", format!("Bearer{}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status().as_u16(), 401);
}

#[actix_web::test]
async fn user_token_cannot_reach_admin_routes(){
    let app = TestApp::spawn_app().await;
    let token = app.create_user_and_login("jeanne.martin@example.com").await;

    let response = app.get_as(Some(&token), "/admin/dashboard").await;

    assert_eq!(response.status().as_u16(), 403);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Admin role required");
}
