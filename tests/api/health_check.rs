use crate::helpers::TestApp;

#[actix_web::test]
async fn health_check_works(){
    let app = TestApp::spawn_app().await;

    let response = app.api_client.get(app.url("/health"))
                    .send()
                    .await
                    .expect("Failed to send request to health endpoint");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}
