use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{delete_session, insert_session, update_session, NewSession},
    models::SessionChangeset,
    routes::ApiError,
    utils::{get_pooled_connection, DbPool},
};

#[tracing::instrument(
    "Scheduling formation session",
    skip(pool, _admin)
)]
pub async fn post_session(
    pool: web::Data<DbPool>,
    formation_id: web::Path<Uuid>,
    body: web::Json<NewSession>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let session = insert_session(conn, formation_id.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Created().json(session))
}

#[tracing::instrument(
    "Updating formation session",
    skip(pool, _admin)
)]
pub async fn put_session(
    pool: web::Data<DbPool>,
    session_id: web::Path<Uuid>,
    body: web::Json<SessionChangeset>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let session = update_session(conn, session_id.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(session))
}

#[tracing::instrument(
    "Deleting formation session",
    skip(pool, _admin)
)]
pub async fn delete_session_route(
    pool: web::Data<DbPool>,
    session_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    delete_session(conn, session_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
