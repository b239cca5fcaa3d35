use marketplace::models::UserProfileInfo;

use crate::helpers::TestApp;

#[actix_web::test]
async fn get_profile_without_token_returns_401(){
    let app = TestApp::spawn_app().await;

    let response = app.get_as(None, "/user/profile").await;

    assert_eq!(response.status().as_u16(), 401)
}

#[actix_web::test]
async fn get_profile_with_logged_in_user(){
    let app = TestApp::spawn_app().await;
    let token = app.create_user_and_login("jeanne.martin@example.com").await;

    let response = app.get_as(Some(&token), "/user/profile").await;

    assert_eq!(response.status().as_u16(), 200);
    let profile: UserProfileInfo = response.json().await.unwrap();
    assert_eq!(profile.email, "jeanne.martin@example.com");
    assert_eq!(profile.name, "Test User");
    assert_eq!(profile.phone_number, None);
}

#[actix_web::test]
async fn post_profile_updates_only_given_fields(){
    let app = TestApp::spawn_app().await;
    let token = app.create_user_and_login("jeanne.martin@example.com").await;

    let response = app.api_client.post(app.url("/user/profile"))
        .bearer_auth(&token)
        .form(&serde_json::json!({
            "phone_number": "06 12 34 56 78",
            "address": "12 rue de la Paix, Paris"
        }))
        .send()
        .await
        .expect("Failed to send request to user profile endpoint");
    assert_eq!(response.status().as_u16(), 200);

    let profile: UserProfileInfo = app.get_as(Some(&token), "/user/profile").await
        .json()
        .await
        .unwrap();

    assert_eq!(profile.name, "Test User");
    assert_eq!(profile.address.as_deref(), Some("12 rue de la Paix, Paris"));
    assert!(profile.phone_number.is_some());
}

#[actix_web::test]
async fn post_profile_with_invalid_email_returns_400(){
    let app = TestApp::spawn_app().await;
    let token = app.create_user_and_login("jeanne.martin@example.com").await;

    let response = app.api_client.post(app.url("/user/profile"))
        .bearer_auth(&token)
        .form(&serde_json::json!({ "email": "not-an-email" }))
        .send()
        .await
        .expect("Failed to send request to user profile endpoint");

    assert_eq!(response.status().as_u16(), 400);
}
