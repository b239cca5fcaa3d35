use std::net::TcpListener;

use actix_web::{
    dev::Server,
    error::InternalError,
    http::StatusCode,
    web::{self, FormConfig, JsonConfig, QueryConfig},
    App, HttpServer,
};
use anyhow::Context;
use diesel::{r2d2::ConnectionManager, PgConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use r2d2::Pool;
use tracing_actix_web::TracingLogger;

use crate::{
    auth::jwt::Tokenizer,
    configuration::{DatabaseSettings, Settings},
    email_client::EmailClient,
    geocoding::GeocodingClient,
    payment::PaymentGateway,
    routes::*,
    telemetry::spawn_blocking_with_tracing,
    utils::{error_body, DbPool},
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

// Public url of the api, used to build links sent by email
pub struct BaseUrl(pub String);

pub struct Application{
    pub host: String,
    pub port: u16,
    pub server: Server
}

impl Application {
    pub async fn new(settings: Settings) -> Result<Self, anyhow::Error>{
        let pool = get_connection_pool(&settings.database)
            .context("Failed to build connection pool")?;

        run_migrations(&pool).await?;

        let email_client = EmailClient::new(&settings.email)?;

        let geocoding_client = GeocodingClient::new(&settings.geocoding)
            .context("Failed to build geocoding client")?;
        let payment_gateway = PaymentGateway::new(&settings.payment, &settings.application.base_url);
        let tokenizer = Tokenizer::new(&settings.jwt);

        let listener = TcpListener::bind((settings.application.host.as_str(), settings.application.port))
            .context("Failed to bind address")?;
        let port = listener.local_addr()?.port();

        let server = run(
            listener,
            pool,
            email_client,
            geocoding_client,
            payment_gateway,
            tokenizer,
            settings.application.base_url
        )?;

        Ok(Application{
            host: settings.application.host,
            port,
            server
        })
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error>{
        self.server.await
    }
}

pub fn get_connection_pool(settings: &DatabaseSettings) -> Result<DbPool, r2d2::Error>{
    let manager = ConnectionManager::<PgConnection>::new(settings.get_database_table_url());
    Pool::builder()
        .max_size(settings.max_connections)
        .build(manager)
}

#[tracing::instrument("Running pending migrations", skip_all)]
async fn run_migrations(pool: &DbPool) -> Result<(), anyhow::Error>{
    let pool = pool.clone();

    spawn_blocking_with_tracing(move || {
        let mut conn = pool.get().context("Failed to get connection from pool")?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to run migrations")?;
        Ok(())
    })
    .await
    .context("Failed due to threadpool error")?
}

// Extractor rejections use the same JSON body as handler errors
fn rejection(err: impl std::fmt::Display) -> actix_web::Error{
    let response = error_body(StatusCode::BAD_REQUEST, &err);
    InternalError::from_response(err.to_string(), response).into()
}

fn run(
    listener: TcpListener,
    pool: DbPool,
    email_client: EmailClient,
    geocoding_client: GeocodingClient,
    payment_gateway: PaymentGateway,
    tokenizer: Tokenizer,
    base_url: String
) -> Result<Server, anyhow::Error>{
    let pool = web::Data::new(pool);
    let email_client = web::Data::new(email_client);
    let geocoding_client = web::Data::new(geocoding_client);
    let payment_gateway = web::Data::new(payment_gateway);
    let tokenizer = web::Data::new(tokenizer);
    let base_url = web::Data::new(BaseUrl(base_url));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(JsonConfig::default().error_handler(|err, _| rejection(err)))
            .app_data(FormConfig::default().error_handler(|err, _| rejection(err)))
            .app_data(QueryConfig::default().error_handler(|err, _| rejection(err)))
            .route("/health", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/confirm", web::get().to(confirm))
            .route("/login", web::post().to(login))
            .route("/home", web::get().to(get_home))
            .route("/settings/public", web::get().to(get_public_settings))
            .route("/properties", web::get().to(get_properties))
            .route("/properties/{slug}", web::get().to(get_property))
            .route("/agents", web::get().to(get_agents))
            .route("/agents/{slug}", web::get().to(get_agent))
            .route("/formations", web::get().to(get_formations))
            .route("/formations/{slug}", web::get().to(get_formation))
            .route("/checkout", web::post().to(post_checkout))
            .route("/checkout/{reference}", web::get().to(get_checkout_order))
            .route("/payments/notify", web::post().to(payment_notify))
            .route("/newsletter/subscribe", web::post().to(subscribe))
            .route("/newsletter/unsubscribe", web::get().to(unsubscribe))
            .service(
                web::scope("/user")
                    .route("/profile", web::get().to(get_profile))
                    .route("/profile", web::post().to(post_profile))
                    .route("/orders", web::get().to(get_user_orders))
                    .route("/notifications", web::get().to(get_notifications))
                    .route("/notifications/read-all", web::post().to(read_all_notifications))
                    .route("/notifications/{id}/read", web::post().to(read_notification))
            )
            .route("/geocoding/search", web::get().to(search_address))
            .service(
                web::scope("/admin")
                    .route("/dashboard", web::get().to(get_dashboard))
                    .route("/properties", web::get().to(admin_get_properties))
                    .route("/properties", web::post().to(post_property))
                    .route("/properties/{id}", web::get().to(admin_get_property))
                    .route("/properties/{id}", web::put().to(put_property))
                    .route("/properties/{id}", web::delete().to(delete_property))
                    .route("/properties/{id}/restore", web::post().to(restore_property))
                    .route("/properties/{id}/purge", web::delete().to(purge_property_route))
                    .route("/properties/{id}/images", web::post().to(post_property_image))
                    .route("/properties/{id}/images/order", web::put().to(put_property_image_order))
                    .route("/properties/{id}/images/{image_id}", web::delete().to(delete_property_image))
                    .route("/agents", web::post().to(post_agent))
                    .route("/agents/{id}", web::put().to(put_agent))
                    .route("/agents/{id}", web::delete().to(delete_agent_route))
                    .route("/formations", web::get().to(admin_get_formations))
                    .route("/formations", web::post().to(post_formation))
                    .route("/formations/{id}", web::get().to(admin_get_formation))
                    .route("/formations/{id}", web::put().to(put_formation))
                    .route("/formations/{id}", web::delete().to(delete_formation))
                    .route("/formations/{id}/purge", web::delete().to(purge_formation_route))
                    .route("/formations/{id}/sessions", web::post().to(post_session))
                    .route("/sessions/{id}", web::put().to(put_session))
                    .route("/sessions/{id}", web::delete().to(delete_session_route))
                    .route("/orders", web::get().to(admin_get_orders))
                    .route("/orders/{id}", web::get().to(admin_get_order))
                    .route("/orders/{id}", web::delete().to(delete_order))
                    .route("/orders/{id}/status", web::put().to(update_order))
                    .route("/orders/{id}/payment", web::put().to(update_order_payment))
                    .route("/newsletter", web::get().to(admin_get_newsletter))
                    .route("/settings", web::get().to(admin_get_settings))
                    .route("/settings", web::put().to(admin_put_settings))
            )
            .app_data(pool.clone())
            .app_data(email_client.clone())
            .app_data(geocoding_client.clone())
            .app_data(payment_gateway.clone())
            .app_data(tokenizer.clone())
            .app_data(base_url.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
