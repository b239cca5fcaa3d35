use serde_json::{json, Value};

use crate::helpers::TestApp;

async fn place_order(app: &TestApp, token: Option<&str>, session_id: &str, quantity: i32) -> String{
    let response = app.checkout(token, &app.checkout_body(session_id, quantity, "bank_transfer")).await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    body["order_id"].as_str().unwrap().to_string()
}

async fn set_status(app: &TestApp, admin: &str, order_id: &str, status: &str) -> reqwest::Response{
    app.put_json_as(admin, &format!("/admin/orders/{}/status", order_id), &json!({ "status": status })).await
}

#[actix_web::test]
async fn order_follows_allowed_transitions(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let order_id = place_order(&app, None, session["session_id"].as_str().unwrap(), 1).await;

    let completed_too_early = set_status(&app, &admin, &order_id, "completed").await;
    assert_eq!(completed_too_early.status().as_u16(), 409);

    let confirmed = set_status(&app, &admin, &order_id, "confirmed").await;
    assert_eq!(confirmed.status().as_u16(), 200);
    let order: Value = confirmed.json().await.unwrap();
    assert_eq!(order["status"], "confirmed");

    let completed = set_status(&app, &admin, &order_id, "completed").await;
    assert_eq!(completed.status().as_u16(), 200);

    let reopened = set_status(&app, &admin, &order_id, "pending").await;
    assert_eq!(reopened.status().as_u16(), 409);
}

#[actix_web::test]
async fn unknown_status_returns_400(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let order_id = place_order(&app, None, session["session_id"].as_str().unwrap(), 1).await;

    let response = set_status(&app, &admin, &order_id, "shipped").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn cancelling_order_releases_seats_once(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let session_id = session["session_id"].as_str().unwrap();
    let order_id = place_order(&app, None, session_id, 4).await;
    assert_eq!(app.seats_taken(session_id), 4);

    let response = set_status(&app, &admin, &order_id, "cancelled").await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.seats_taken(session_id), 0);

    let again = set_status(&app, &admin, &order_id, "cancelled").await;
    assert_eq!(again.status().as_u16(), 200);
    assert_eq!(app.seats_taken(session_id), 0);
}

#[actix_web::test]
async fn deleting_order_releases_its_seats(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let session_id = session["session_id"].as_str().unwrap();
    let order_id = place_order(&app, None, session_id, 3).await;

    let response = app.delete_as(&admin, &format!("/admin/orders/{}", order_id)).await;
    assert_eq!(response.status().as_u16(), 204);

    assert_eq!(app.seats_taken(session_id), 0);
    let response = app.get_as(Some(&admin), &format!("/admin/orders/{}", order_id)).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[actix_web::test]
async fn deleting_cancelled_order_does_not_release_twice(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let session_id = session["session_id"].as_str().unwrap();
    let cancelled = place_order(&app, None, session_id, 3).await;
    place_order(&app, None, session_id, 2).await;

    set_status(&app, &admin, &cancelled, "cancelled").await;
    app.delete_as(&admin, &format!("/admin/orders/{}", cancelled)).await;

    assert_eq!(app.seats_taken(session_id), 2);
}

#[actix_web::test]
async fn status_change_notifies_the_customer_account(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let user = app.create_user_and_login("jeanne.martin@example.com").await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let order_id = place_order(&app, Some(&user), session["session_id"].as_str().unwrap(), 1).await;

    set_status(&app, &admin, &order_id, "confirmed").await;

    let notifications: Value = app.get_as(Some(&user), "/user/notifications").await.json().await.unwrap();
    assert_eq!(notifications["unread"], 1);
    assert_eq!(notifications["items"][0]["title"], "Commande mise à jour");
}

#[actix_web::test]
async fn admin_lists_orders_with_filters(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let session_id = session["session_id"].as_str().unwrap();

    let first = place_order(&app, None, session_id, 1).await;
    place_order(&app, None, session_id, 1).await;
    place_order(&app, None, session_id, 1).await;
    set_status(&app, &admin, &first, "confirmed").await;

    let all: Value = app.get_as(Some(&admin), "/admin/orders").await.json().await.unwrap();
    assert_eq!(all["total"], 3);

    let pending: Value = app.get_as(Some(&admin), "/admin/orders?status=pending").await.json().await.unwrap();
    assert_eq!(pending["total"], 2);

    let confirmed: Value = app.get_as(Some(&admin), "/admin/orders?status=confirmed&limit=1").await.json().await.unwrap();
    assert_eq!(confirmed["total"], 1);
    assert_eq!(confirmed["items"][0]["order_id"], first.as_str());
}

#[actix_web::test]
async fn manual_payment_update_sets_paid_at(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let order_id = place_order(&app, None, session["session_id"].as_str().unwrap(), 1).await;

    let response = app.put_json_as(&admin, &format!("/admin/orders/{}/payment", order_id), &json!({ "payment_status": "paid" })).await;
    assert_eq!(response.status().as_u16(), 200);

    let order: Value = response.json().await.unwrap();
    assert_eq!(order["payment_status"], "paid");
    assert!(order["paid_at"].is_string());
}
