use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{db_interaction::confirm_user, utils::{get_pooled_connection, DbPool}};

use super::ApiError;

// Struct representing query parameter for confirmation endpoint
#[derive(Deserialize, Debug)]
pub struct Confirmation{
    id: Uuid
}

#[tracing::instrument(
    "Confirm user status",
    skip(pool)
)]
pub async fn confirm(
    pool: web::Data<DbPool>,
    query: web::Query<Confirmation>
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let user_id = confirm_user(conn, query.0.id).await?;
    tracing::info!(%user_id, "Account confirmed");

    Ok(HttpResponse::Ok().body("confirmed subscription"))
}
