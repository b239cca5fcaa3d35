use serde_json::{json, Value};

use crate::helpers::TestApp;

#[actix_web::test]
async fn unpublished_formations_are_hidden_from_public(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let draft = app.post_json_as(Some(&admin), "/admin/formations", &json!({
        "title": "Brouillon",
        "price_cents": 10_000
    })).await;
    assert_eq!(draft.status().as_u16(), 201);
    let draft: Value = draft.json().await.unwrap();

    let page: Value = app.get_as(None, "/formations").await.json().await.unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["title"], "Loi Alur");
    assert_eq!(page["items"][0]["price_label"], "450 €");
    assert!(page["items"][0]["next_session_on"].is_string());

    let response = app.get_as(None, &format!("/formations/{}", draft["slug"].as_str().unwrap())).await;
    assert_eq!(response.status().as_u16(), 404);

    let admin_page: Value = app.get_as(Some(&admin), "/admin/formations").await.json().await.unwrap();
    assert_eq!(admin_page["total"], 2);
}

#[actix_web::test]
async fn formation_detail_lists_upcoming_sessions_with_seats_left(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let (formation, _) = app.create_formation_with_session(&admin, "Transaction immobilière", 90_000, 12, 14).await;
    let formation_id = formation["formation_id"].as_str().unwrap();

    let response = app.post_json_as(Some(&admin), &format!("/admin/formations/{}/sessions", formation_id), &json!({
        "starts_on": (chrono::Utc::now().date_naive() + chrono::Duration::days(3)).to_string(),
        "city": "Paris",
        "seats_total": 8,
        "price_cents": 80_000
    })).await;
    assert_eq!(response.status().as_u16(), 201);

    let detail: Value = app.get_as(None, &format!("/formations/{}", formation["slug"].as_str().unwrap())).await
        .json()
        .await
        .unwrap();

    let sessions = detail["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["city"], "Paris");
    assert_eq!(sessions[0]["price_cents"], 80_000);
    assert_eq!(sessions[0]["seats_left"], 8);
    assert_eq!(sessions[1]["city"], "Lyon");
    assert_eq!(sessions[1]["price_cents"], 90_000);
}

#[actix_web::test]
async fn invalid_session_returns_400(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let (formation, _) = app.create_formation_with_session(&admin, "Fiscalité", 30_000, 5, 10).await;
    let path = format!("/admin/formations/{}/sessions", formation["formation_id"].as_str().unwrap());
    let today = chrono::Utc::now().date_naive();

    let test_cases = vec![
        (json!({ "starts_on": today.to_string(), "city": "Lyon", "seats_total": 0 }), "no seats"),
        (json!({ "starts_on": today.to_string(), "ends_on": (today - chrono::Duration::days(1)).to_string(), "city": "Lyon", "seats_total": 5 }), "ends before start"),
        (json!({ "starts_on": today.to_string(), "city": " ", "seats_total": 5 }), "blank city"),
        (json!({ "starts_on": "tomorrow", "city": "Lyon", "seats_total": 5 }), "bad date"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json_as(Some(&admin), &path, &body).await;
        assert_eq!(response.status().as_u16(), 400, "session was accepted with {}", description);
    }
}

#[actix_web::test]
async fn session_with_reservations_cannot_shrink_or_be_deleted(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let (_, session) = app.create_formation_with_session(&admin, "Copropriété", 40_000, 5, 10).await;
    let session_id = session["session_id"].as_str().unwrap();

    let response = app.checkout(None, &app.checkout_body(session_id, 3, "bank_transfer")).await;
    assert_eq!(response.status().as_u16(), 201);

    let shrink = app.put_json_as(&admin, &format!("/admin/sessions/{}", session_id), &json!({ "seats_total": 2 })).await;
    assert_eq!(shrink.status().as_u16(), 409);

    let grow = app.put_json_as(&admin, &format!("/admin/sessions/{}", session_id), &json!({ "seats_total": 9 })).await;
    assert_eq!(grow.status().as_u16(), 200);
    let grown: Value = grow.json().await.unwrap();
    assert_eq!(grown["seats_total"], 9);

    let delete = app.delete_as(&admin, &format!("/admin/sessions/{}", session_id)).await;
    assert_eq!(delete.status().as_u16(), 409);
}

#[actix_web::test]
async fn empty_session_can_be_deleted(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let (_, session) = app.create_formation_with_session(&admin, "Urbanisme", 40_000, 5, 10).await;

    let response = app.delete_as(&admin, &format!("/admin/sessions/{}", session["session_id"].as_str().unwrap())).await;

    assert_eq!(response.status().as_u16(), 204);
}

#[actix_web::test]
async fn soft_deleted_formation_disappears_from_public(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let (formation, _) = app.create_formation_with_session(&admin, "Gestion locative", 40_000, 5, 10).await;

    let response = app.delete_as(&admin, &format!("/admin/formations/{}", formation["formation_id"].as_str().unwrap())).await;
    assert_eq!(response.status().as_u16(), 204);

    let page: Value = app.get_as(None, "/formations").await.json().await.unwrap();
    assert_eq!(page["total"], 0);
}
