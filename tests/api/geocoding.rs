use serde_json::Value;
use wiremock::{matchers::{method, path, query_param}, Mock, ResponseTemplate};

use crate::helpers::TestApp;

#[actix_web::test]
async fn admin_gets_address_suggestions(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    Mock::given(method("GET"))
        .and(path("/search/"))
        .and(query_param("q", "8 bd du palais"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [2.347, 48.859] },
                "properties": { "label": "8 Boulevard du Palais 75001 Paris", "city": "Paris", "postcode": "75001" }
            }]
        })))
        .expect(1)
        .mount(&app.geocoding_api)
        .await;

    let response = app.get_as(Some(&admin), "/geocoding/search?q=8%20bd%20du%20palais").await;
    assert_eq!(response.status().as_u16(), 200);

    let suggestions: Value = response.json().await.unwrap();
    assert_eq!(suggestions[0]["postal_code"], "75001");
    assert_eq!(suggestions[0]["latitude"], 48.859);
}

#[actix_web::test]
async fn short_query_does_not_call_the_provider(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    Mock::given(path("/search/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.geocoding_api)
        .await;

    let suggestions: Value = app.get_as(Some(&admin), "/geocoding/search?q=8b").await.json().await.unwrap();

    assert_eq!(suggestions, serde_json::json!([]));
}

#[actix_web::test]
async fn provider_failure_returns_500(){
    let app = TestApp::spawn_app().await;
    let admin = app.create_admin_and_login().await;

    Mock::given(path("/search/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.geocoding_api)
        .await;

    let response = app.get_as(Some(&admin), "/geocoding/search?q=rue de la paix").await;

    assert_eq!(response.status().as_u16(), 500);
}

#[actix_web::test]
async fn address_search_requires_admin(){
    let app = TestApp::spawn_app().await;

    let response = app.get_as(None, "/geocoding/search?q=rue de la paix").await;

    assert_eq!(response.status().as_u16(), 401);
}
