use actix_web::{web, HttpResponse};

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{get_site_settings, update_site_settings, PublicSettings, SettingsUpdate},
    domain::user_email::UserEmail,
    utils::{get_pooled_connection, DbPool},
};

use super::ApiError;

#[tracing::instrument(
    "Getting public settings",
    skip(pool)
)]
pub async fn get_public_settings(
    pool: web::Data<DbPool>
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let settings = get_site_settings(conn).await?;

    Ok(HttpResponse::Ok().json(PublicSettings::from(settings)))
}

#[tracing::instrument(
    "Getting site settings",
    skip(pool, _admin)
)]
pub async fn admin_get_settings(
    pool: web::Data<DbPool>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let settings = get_site_settings(conn).await?;

    Ok(HttpResponse::Ok().json(settings))
}

#[tracing::instrument(
    "Updating site settings",
    skip(pool, _admin)
)]
pub async fn admin_put_settings(
    pool: web::Data<DbPool>,
    body: web::Json<SettingsUpdate>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let mut update = body.into_inner();
    if let Some(email) = update.contact_email.take() {
        update.contact_email = Some(UserEmail::parse(email).map_err(ApiError::BadRequest)?.inner());
    }

    let conn = get_pooled_connection(&pool).await?;
    let settings = update_site_settings(conn, update).await?;

    Ok(HttpResponse::Ok().json(settings))
}
