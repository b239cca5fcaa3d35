use serde_json::{json, Value};

use crate::helpers::TestApp;

#[actix_web::test]
async fn home_page_shows_featured_properties_and_upcoming_sessions(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    app.create_property(&admin, json!({
        "title": "Villa vue mer",
        "property_type": "house",
        "transaction_type": "sale",
        "price_cents": 120_000_000,
        "city": "Nice",
        "is_featured": true
    })).await;
    app.create_property(&admin, json!({
        "title": "Parking",
        "property_type": "parking",
        "transaction_type": "rental",
        "price_cents": 8_000,
        "city": "Nice"
    })).await;
    app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    app.create_formation_with_session(&admin, "Archive", 45_000, 10, -7).await;

    let response = app.get_as(None, "/home").await;
    assert_eq!(response.status().as_u16(), 200);
    let home: Value = response.json().await.unwrap();

    let featured = home["featured_properties"].as_array().unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0]["title"], "Villa vue mer");
    assert_eq!(featured[0]["price_label"], "1 200 000 €");

    let sessions = home["upcoming_sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["formation_title"], "Loi Alur");
    assert_eq!(sessions[0]["seats_left"], 10);

    assert_eq!(home["settings"]["site_name"], "Marketplace");
}

#[actix_web::test]
async fn dashboard_counts_catalogue_and_paid_orders(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    app.create_property(&admin, json!({
        "title": "T2",
        "property_type": "apartment",
        "transaction_type": "sale",
        "price_cents": 15_000_000,
        "city": "Lyon"
    })).await;
    let (_, session) = app.create_formation_with_session(&admin, "Loi Alur", 45_000, 10, 7).await;
    let session_id = session["session_id"].as_str().unwrap();

    let paid: Value = app.checkout(None, &app.checkout_body(session_id, 2, "card")).await.json().await.unwrap();
    app.checkout(None, &app.checkout_body(session_id, 1, "card")).await;
    app.post_payment_notification(paid["reference"].as_str().unwrap(), 90_000, "paid", false).await;

    let dashboard: Value = app.get_as(Some(&admin), "/admin/dashboard").await.json().await.unwrap();

    assert_eq!(dashboard["active_properties"], 1);
    assert_eq!(dashboard["published_formations"], 1);
    assert_eq!(dashboard["pending_orders"], 1);
    assert_eq!(dashboard["paid_total_cents"], 90_000);
    assert_eq!(dashboard["paid_total_label"], "900 €");
}

#[actix_web::test]
async fn empty_dashboard_has_zero_totals(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let dashboard: Value = app.get_as(Some(&admin), "/admin/dashboard").await.json().await.unwrap();

    assert_eq!(dashboard["paid_total_cents"], 0);
    assert_eq!(dashboard["pending_orders"], 0);
}
