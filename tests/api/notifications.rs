use serde_json::{json, Value};

use crate::helpers::TestApp;

#[actix_web::test]
async fn new_order_notifies_every_admin(){
    let app = TestApp::spawn_app().await;
    let first_admin = app.create_admin_and_login().await;
    let second_admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&first_admin, "Loi Alur", 45_000, 10, 7).await;

    app.checkout(None, &app.checkout_body(session["session_id"].as_str().unwrap(), 1, "card")).await;

    for token in [&first_admin, &second_admin] {
        let notifications: Value = app.get_as(Some(token), "/user/notifications").await.json().await.unwrap();
        assert_eq!(notifications["total"], 1);
        assert_eq!(notifications["items"][0]["title"], "Nouvelle commande");
        assert_eq!(notifications["items"][0]["is_read"], false);
    }
}

#[actix_web::test]
async fn notifications_can_be_marked_read(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let session_id = session["session_id"].as_str().unwrap();

    for _ in 0..3 {
        app.checkout(None, &app.checkout_body(session_id, 1, "card")).await;
    }

    let notifications: Value = app.get_as(Some(&admin), "/user/notifications").await.json().await.unwrap();
    assert_eq!(notifications["unread"], 3);
    let first_id = notifications["items"][0]["notification_id"].as_str().unwrap();

    let response = app.post_json_as(Some(&admin), &format!("/user/notifications/{}/read", first_id), &json!({})).await;
    assert_eq!(response.status().as_u16(), 204);

    let unread: Value = app.get_as(Some(&admin), "/user/notifications?unread_only=true").await.json().await.unwrap();
    assert_eq!(unread["total"], 2);
    assert_eq!(unread["unread"], 2);

    let response = app.post_json_as(Some(&admin), "/user/notifications/read-all", &json!({})).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["updated"], 2);

    let notifications: Value = app.get_as(Some(&admin), "/user/notifications").await.json().await.unwrap();
    assert_eq!(notifications["unread"], 0);
    assert_eq!(notifications["total"], 3);
}

#[actix_web::test]
async fn users_cannot_read_notifications_of_others(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let user = app.create_user_and_login("jeanne.martin@example.com").await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;

    app.checkout(None, &app.checkout_body(session["session_id"].as_str().unwrap(), 1, "card")).await;
    let notifications: Value = app.get_as(Some(&admin), "/user/notifications").await.json().await.unwrap();
    let admin_notification = notifications["items"][0]["notification_id"].as_str().unwrap();

    let response = app.post_json_as(Some(&user), &format!("/user/notifications/{}/read", admin_notification), &json!({})).await;
    assert_eq!(response.status().as_u16(), 404);

    let user_notifications: Value = app.get_as(Some(&user), "/user/notifications").await.json().await.unwrap();
    assert_eq!(user_notifications["total"], 0);
}
