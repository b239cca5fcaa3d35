use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::{auth::extractors::IsAdmin, db_interaction::delete_order_from_database, routes::ApiError, utils::{get_pooled_connection, DbPool}};

#[tracing::instrument(
    "Deleting order by id",
    skip(pool, _admin)
)]
pub async fn delete_order(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    delete_order_from_database(conn, order_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
