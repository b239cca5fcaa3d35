use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{list_active_subscriptions, subscribe_to_newsletter, unsubscribe_from_newsletter},
    domain::user_email::UserEmail,
    email_client::{EmailClient, EmailMessage},
    startup::BaseUrl,
    utils::{get_pooled_connection, DbPool, Page, PageQuery, Pagination},
};

use super::ApiError;

#[derive(Deserialize, Debug)]
pub struct SubscribeForm{
    pub email: String
}

#[derive(Deserialize, Debug)]
pub struct UnsubscribeQuery{
    pub token: String
}

#[tracing::instrument(
    "Subscribing to newsletter",
    skip(pool, email_client, base_url)
)]
pub async fn subscribe(
    pool: web::Data<DbPool>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<BaseUrl>,
    form: web::Form<SubscribeForm>
) -> Result<HttpResponse, ApiError>{
    let email = UserEmail::parse(form.into_inner().email)
        .map_err(ApiError::BadRequest)?;

    let conn = get_pooled_connection(&pool).await?;
    let subscription = subscribe_to_newsletter(conn, email.inner()).await?;

    // The subscription stands even when the welcome email bounces
    let unsubscribe_link = format!("{}newsletter/unsubscribe?token={}", base_url.0, subscription.token);
    let text = format!(
        "Votre inscription à la newsletter est confirmée.\nPour vous désinscrire : {}",
        unsubscribe_link
    );
    let message = EmailMessage::plain(&email, "Inscription à la newsletter", &text, "newsletter-welcome");
    if let Err(e) = email_client.send(&message).await {
        tracing::warn!(error = ?e, "Failed to send newsletter welcome email");
    }

    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(
    "Unsubscribing from newsletter",
    skip(pool, query)
)]
pub async fn unsubscribe(
    pool: web::Data<DbPool>,
    query: web::Query<UnsubscribeQuery>
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    unsubscribe_from_newsletter(conn, query.into_inner().token).await?;

    Ok(HttpResponse::Ok().body("unsubscribed"))
}

#[tracing::instrument(
    "Listing newsletter subscribers",
    skip(pool, _admin)
)]
pub async fn admin_get_newsletter(
    pool: web::Data<DbPool>,
    page: web::Query<PageQuery>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let pagination = Pagination::from(page.into_inner());
    let conn = get_pooled_connection(&pool).await?;

    let (subscriptions, total) = list_active_subscriptions(conn, pagination).await?;

    Ok(HttpResponse::Ok().json(Page::new(subscriptions, total, pagination)))
}
