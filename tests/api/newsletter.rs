use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl};
use serde_json::Value;
use wiremock::{matchers::path, Mock, ResponseTemplate};

use crate::helpers::{ReceiveEmailRequest, TestApp};

async fn subscribe(app: &TestApp, email: &str) -> reqwest::Response{
    app.api_client.post(app.url("/newsletter/subscribe"))
        .form(&serde_json::json!({ "email": email }))
        .send()
        .await
        .expect("Failed to send request to subscribe endpoint")
}

fn token_of(app: &TestApp, email: &str) -> String{
    use marketplace::schema::newsletter_subscriptions;

    let mut conn = app.pool.get().unwrap();
    newsletter_subscriptions::table
        .filter(newsletter_subscriptions::email.eq(email))
        .select(newsletter_subscriptions::token)
        .first::<String>(&mut conn)
        .unwrap()
}

#[actix_web::test]
async fn subscribe_with_valid_email_returns_200(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let response = subscribe(&app, "lecteur@example.com").await;
    assert_eq!(response.status().as_u16(), 200);

    let page: Value = app.get_as(Some(&admin), "/admin/newsletter").await.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["email"], "lecteur@example.com");
}

#[actix_web::test]
async fn subscribe_with_invalid_email_returns_400(){
    let app = TestApp::spawn_app().await;

    let response = subscribe(&app, "lecteur").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn unsubscribe_then_subscribe_again_keeps_token(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    subscribe(&app, "lecteur@example.com").await;
    let token = token_of(&app, "lecteur@example.com");

    let response = app.get_as(None, &format!("/newsletter/unsubscribe?token={}", token)).await;
    assert_eq!(response.status().as_u16(), 200);

    let page: Value = app.get_as(Some(&admin), "/admin/newsletter").await.json().await.unwrap();
    assert_eq!(page["total"], 0);

    subscribe(&app, "lecteur@example.com").await;
    assert_eq!(token_of(&app, "lecteur@example.com"), token);

    let page: Value = app.get_as(Some(&admin), "/admin/newsletter").await.json().await.unwrap();
    assert_eq!(page["total"], 1);
}

#[actix_web::test]
async fn unsubscribe_with_unknown_token_returns_404(){
    let app = TestApp::spawn_app().await;

    let response = app.get_as(None, "/newsletter/unsubscribe?token=unknown").await;

    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn welcome_email_carries_working_unsubscribe_link(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_api)
        .await;

    let response = subscribe(&app, "lecteur@example.com").await;
    assert_eq!(response.status().as_u16(), 200);

    let requests = app.email_api.received_requests().await.unwrap();
    let email: ReceiveEmailRequest = requests[0].body_json().unwrap();
    assert_eq!(email.to, "lecteur@example.com");
    assert!(email.text_body.contains(&token_of(&app, "lecteur@example.com")));

    let link = app.get_confirmation_link(&email.text_body);
    let response = app.api_client.get(link).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let page: Value = app.get_as(Some(&admin), "/admin/newsletter").await.json().await.unwrap();
    assert_eq!(page["total"], 0);
}

#[actix_web::test]
async fn subscribe_succeeds_when_email_api_fails(){
    let app = TestApp::spawn_app().await;

    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_api)
        .await;

    let response = subscribe(&app, "lecteur@example.com").await;

    assert_eq!(response.status().as_u16(), 200);
    assert!(!token_of(&app, "lecteur@example.com").is_empty());
}
