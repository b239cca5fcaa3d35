use actix_web::{web, HttpResponse};

use crate::{auth::extractors::IsUser, db_interaction::get_user_profile_info, routes::ApiError, utils::{get_pooled_connection, DbPool}};

#[tracing::instrument(
    "Get profile data of logged in user",
    skip(pool, uid)
)]
pub async fn get_profile(
    pool: web::Data<DbPool>,
    uid: IsUser
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let user_profile_info = get_user_profile_info(conn, uid.0).await?;

    Ok(HttpResponse::Ok().json(user_profile_info))
}
