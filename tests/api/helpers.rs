use std::collections::BTreeMap;

use diesel::{r2d2::ConnectionManager, Connection, PgConnection, RunQueryDsl};
use marketplace::{
    configuration::{DatabaseSettings, Settings},
    models::User,
    password::compute_password_hash,
    payment::PaymentGateway,
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
    utils::DbPool,
};
use once_cell::sync::Lazy;
use r2d2::Pool;
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use wiremock::{matchers::{header_exists, path}, Mock, MockServer, ResponseTemplate};

static LOGGER_INSTANCE: Lazy<()> = Lazy::new(|| {
    let log_level = "info".to_string();
    let name = "marketplace-test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(name, log_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(name, log_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const TEST_PASSWORD: &str = "testpassword";

#[derive(Deserialize, Debug)]
pub struct LoginResponse{
    pub token: String
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveEmailRequest{
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

pub struct TestApp{
    pub host: String,
    pub port: u16,
    pub pool: DbPool,
    pub email_api: MockServer,
    pub geocoding_api: MockServer,
    pub payment_gateway: PaymentGateway,
    pub api_client: reqwest::Client
}

impl TestApp {
    // Creates an empty database, the application migrates it on startup
    fn create_db(settings: &DatabaseSettings) -> DbPool{
        let mut connection = PgConnection::establish(&settings.get_database_url())
                                .expect("Failed to connect to postgres database");

        let query = format!(r#"CREATE DATABASE "{}";"#, settings.name);
        diesel::sql_query(query)
            .execute(&mut connection)
            .expect("Failed to create test database");

        Pool::builder()
            .max_size(4)
            .build(ConnectionManager::<PgConnection>::new(settings.get_database_table_url()))
            .expect("Failed to build connection pool to test database")
    }

    pub fn get_app_url(&self) -> String{
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn url(&self, path: &str) -> String{
        format!("{}{}", self.get_app_url(), path)
    }

    pub async fn spawn_app() -> TestApp{
        Lazy::force(&LOGGER_INSTANCE);

        let email_api = MockServer::start().await;
        let geocoding_api = MockServer::start().await;

        let mut settings = Settings::get().expect("Failed to read configuration");
        settings.application.port = 0;
        settings.database.name = Uuid::new_v4().to_string();
        settings.email.api_uri = email_api.uri();
        settings.geocoding.api_uri = geocoding_api.uri();

        let pool = TestApp::create_db(&settings.database);
        let payment_gateway = PaymentGateway::new(&settings.payment, &settings.application.base_url);

        let application = Application::new(settings)
                            .await
                            .expect("Failed to build application");

        let host = application.host.clone();
        let port = application.port;
        tokio::task::spawn(application.server);

        let api_client = reqwest::Client::builder()
                            .redirect(Policy::none())
                            .build()
                            .unwrap();

        TestApp{
            host,
            port,
            pool,
            email_api,
            geocoding_api,
            payment_gateway,
            api_client
        }
    }

    pub fn get_confirmation_link(&self, text: &str) -> String{
        let links: Vec<_> = linkify::LinkFinder::new()
                    .links(text)
                    .filter(|l| *l.kind() == linkify::LinkKind::Url)
                    .collect();
        assert_eq!(links.len(), 1);
        let raw_link = links[0].as_str().to_owned();
        let mut confirmation_link = reqwest::Url::parse(&raw_link).unwrap();

        assert_eq!(confirmation_link.host_str().unwrap(), "localhost");
        confirmation_link.set_port(Some(self.port)).unwrap();

        confirmation_link.to_string()
    }

    pub async fn post_registration(&self, email: &str, name: &str) -> reqwest::Response{
        self.api_client.post(self.url("/register"))
            .form(&serde_json::json!({
                "email": email,
                "name": name,
                "password": TEST_PASSWORD,
                "confirm_password": TEST_PASSWORD
            }))
            .send()
            .await
            .expect("Failed to send request to register endpoint")
    }

    pub async fn post_login(&self, email: &str, password: &str) -> reqwest::Response{
        self.api_client.post(self.url("/login"))
            .form(&serde_json::json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to send request to login endpoint")
    }

    // Registers through the api, follows the emailed link and logs in
    pub async fn create_user_and_login(&self, email: &str) -> String{
        let guard = Mock::given(path("/email"))
            .and(header_exists("X-Postmark-Server-Token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount_as_scoped(&self.email_api)
            .await;

        let response = self.post_registration(email, "Test User").await;
        assert_eq!(response.status().as_u16(), 200);

        let requests = guard.received_requests().await;
        let email_request: ReceiveEmailRequest = requests[0].body_json().unwrap();
        let link = self.get_confirmation_link(&email_request.text_body);

        let confirm_response = self.api_client.get(link)
            .send()
            .await
            .expect("Failed to send request to confirm endpoint");
        assert_eq!(confirm_response.status().as_u16(), 200);

        self.login_token(email).await
    }

    // Admin accounts are not created through the api
    pub async fn create_admin_and_login(&self) -> String{
        let email = format!("admin-{}@example.com", Uuid::new_v4());
        let password_hash = compute_password_hash(SecretString::from(TEST_PASSWORD.to_string()))
            .expect("Failed to hash password");

        let admin = User{
            user_id: Uuid::new_v4(),
            name: "Admin".to_string(),
            email: email.clone(),
            password: password_hash.expose_secret().to_string(),
            status: Some("confirmed".to_string()),
            is_admin: true
        };

        {
            use marketplace::schema::users;

            let mut conn = self.pool.get().unwrap();
            diesel::insert_into(users::table)
                .values(&admin)
                .execute(&mut conn)
                .expect("Failed to insert admin");
        }

        self.login_token(&email).await
    }

    async fn login_token(&self, email: &str) -> String{
        let response = self.post_login(email, TEST_PASSWORD).await;
        assert_eq!(response.status().as_u16(), 200);

        response.json::<LoginResponse>()
            .await
            .expect("Failed to parse login response")
            .token
    }

    pub async fn get_as(&self, token: Option<&str>, path: &str) -> reqwest::Response{
        let mut request = self.api_client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send()
            .await
            .expect("Failed to send GET request")
    }

    pub async fn post_json_as(&self, token: Option<&str>, path: &str, body: &Value) -> reqwest::Response{
        let mut request = self.api_client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send()
            .await
            .expect("Failed to send POST request")
    }

    pub async fn put_json_as(&self, token: &str, path: &str, body: &Value) -> reqwest::Response{
        self.api_client.put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request")
    }

    pub async fn delete_as(&self, token: &str, path: &str) -> reqwest::Response{
        self.api_client.delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send DELETE request")
    }

    pub async fn create_property(&self, admin_token: &str, body: Value) -> Value{
        let response = self.post_json_as(Some(admin_token), "/admin/properties", &body).await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    // Published formation with one session `days_ahead` days from today,
    // returns (formation, session) as JSON
    pub async fn create_formation_with_session(
        &self,
        admin_token: &str,
        title: &str,
        price_cents: i64,
        seats_total: i32,
        days_ahead: i64
    ) -> (Value, Value){
        let formation_response = self.post_json_as(Some(admin_token), "/admin/formations", &serde_json::json!({
            "title": title,
            "description": "Formation professionnelle",
            "category": "immobilier",
            "price_cents": price_cents,
            "is_published": true
        })).await;
        assert_eq!(formation_response.status().as_u16(), 201);
        let formation: Value = formation_response.json().await.unwrap();

        let starts_on = chrono::Utc::now().date_naive() + chrono::Duration::days(days_ahead);
        let session_response = self.post_json_as(
            Some(admin_token),
            &format!("/admin/formations/{}/sessions", formation["formation_id"].as_str().unwrap()),
            &serde_json::json!({
                "starts_on": starts_on.to_string(),
                "city": "Lyon",
                "seats_total": seats_total
            })
        ).await;
        assert_eq!(session_response.status().as_u16(), 201);
        let session: Value = session_response.json().await.unwrap();

        (formation, session)
    }

    pub fn checkout_body(&self, session_id: &str, quantity: i32, payment_method: &str) -> Value{
        serde_json::json!({
            "first_name": "Jeanne",
            "last_name": "Martin",
            "email": "jeanne.martin@example.com",
            "phone": "06 12 34 56 78",
            "payment_method": payment_method,
            "items": [{ "session_id": session_id, "quantity": quantity }]
        })
    }

    pub async fn checkout(&self, token: Option<&str>, body: &Value) -> reqwest::Response{
        self.post_json_as(token, "/checkout", body).await
    }

    // Posts a payment provider callback signed like the provider does
    pub async fn post_payment_notification(&self, reference: &str, amount: i64, result: &str, tamper: bool) -> reqwest::Response{
        let mut fields = BTreeMap::new();
        fields.insert("order_ref".to_string(), reference.to_string());
        fields.insert("amount".to_string(), amount.to_string());
        fields.insert("result".to_string(), result.to_string());
        let signature = self.payment_gateway.sign(&fields);
        fields.insert("signature".to_string(), signature);

        if tamper {
            fields.insert("amount".to_string(), (amount + 1).to_string());
        }

        self.api_client.post(self.url("/payments/notify"))
            .form(&fields)
            .send()
            .await
            .expect("Failed to send payment notification")
    }

    pub fn seats_taken(&self, session_id: &str) -> i32{
        use diesel::{ExpressionMethods, QueryDsl};
        use marketplace::schema::formation_sessions;

        let session_id = Uuid::parse_str(session_id).unwrap();
        let mut conn = self.pool.get().unwrap();
        formation_sessions::table
            .filter(formation_sessions::session_id.eq(session_id))
            .select(formation_sessions::seats_taken)
            .first::<i32>(&mut conn)
            .unwrap()
    }
}
