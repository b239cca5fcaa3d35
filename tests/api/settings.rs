use serde_json::{json, Value};

use crate::helpers::TestApp;

#[actix_web::test]
async fn defaults_are_served_before_any_update(){
    let app = TestApp::spawn_app().await;

    let settings: Value = app.get_as(None, "/settings/public").await.json().await.unwrap();

    assert_eq!(settings["site_name"], "Marketplace");
    assert_eq!(settings["card_payment_enabled"], true);
    assert_eq!(settings["bank_transfer_enabled"], true);
}

#[actix_web::test]
async fn partial_update_keeps_other_values(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    app.put_json_as(&admin, "/admin/settings", &json!({ "site_name": "Agence du Port" })).await;
    let response = app.put_json_as(&admin, "/admin/settings", &json!({ "contact_phone": "04 78 00 00 00" })).await;
    assert_eq!(response.status().as_u16(), 200);

    let settings: Value = app.get_as(Some(&admin), "/admin/settings").await.json().await.unwrap();
    assert_eq!(settings["site_name"], "Agence du Port");
    assert_eq!(settings["contact_phone"], "04 78 00 00 00");
}

#[actix_web::test]
async fn public_settings_hide_bank_details(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    app.put_json_as(&admin, "/admin/settings", &json!({ "bank_iban": "FR7630006000011234567890189" })).await;

    let settings: Value = app.get_as(None, "/settings/public").await.json().await.unwrap();
    assert!(settings.get("bank_iban").is_none());

    let admin_settings: Value = app.get_as(Some(&admin), "/admin/settings").await.json().await.unwrap();
    assert_eq!(admin_settings["bank_iban"], "FR7630006000011234567890189");
}

#[actix_web::test]
async fn invalid_settings_return_400(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    let test_cases = vec![
        (json!({ "contact_email": "contact" }), "invalid contact email"),
        (json!({ "site_name": " " }), "blank site name"),
        (json!({ "listings_per_page": 0 }), "zero listings per page"),
        (json!({ "card_payment_enabled": "yes" }), "mistyped flag"),
    ];

    for (body, description) in test_cases {
        let response = app.put_json_as(&admin, "/admin/settings", &body).await;
        assert_eq!(response.status().as_u16(), 400, "settings were accepted with {}", description);
    }
}

#[actix_web::test]
async fn listings_per_page_drives_default_page_size(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    for i in 0..3 {
        app.create_property(&admin, json!({
            "title": format!("Studio {}", i),
            "property_type": "apartment",
            "transaction_type": "rental",
            "price_cents": 70_000,
            "city": "Grenoble"
        })).await;
    }
    app.put_json_as(&admin, "/admin/settings", &json!({ "listings_per_page": 2 })).await;

    let page: Value = app.get_as(None, "/properties").await.json().await.unwrap();

    assert_eq!(page["limit"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"][0]["price_label"], "700 €/mois");
}

#[actix_web::test]
async fn settings_require_admin(){
    let app = TestApp::spawn_app().await;
    let user = app.create_user_and_login("jeanne.martin@example.com").await;

    let response = app.get_as(Some(&user), "/admin/settings").await;

    assert_eq!(response.status().as_u16(), 403);
}
