use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{
        get_formation_by_id, insert_formation, list_formation_cards, purge_formation,
        set_formation_deleted, update_formation, FormationFilter, FormationUpdate, NewFormation,
    },
    routes::ApiError,
    utils::{get_pooled_connection, DbPool, Page, PageQuery, Pagination},
};

#[tracing::instrument(
    "Admin listing of formations",
    skip(pool, _admin)
)]
pub async fn admin_get_formations(
    pool: web::Data<DbPool>,
    filter: web::Query<FormationFilter>,
    page: web::Query<PageQuery>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let mut filter = filter.into_inner();
    filter.include_unpublished = true;

    let pagination = Pagination::from(page.into_inner());
    let conn = get_pooled_connection(&pool).await?;

    let (cards, total) = list_formation_cards(conn, filter, pagination).await?;

    Ok(HttpResponse::Ok().json(Page::new(cards, total, pagination)))
}

#[tracing::instrument(
    "Admin formation detail",
    skip(pool, _admin)
)]
pub async fn admin_get_formation(
    pool: web::Data<DbPool>,
    formation_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let detail = get_formation_by_id(conn, formation_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(detail))
}

#[tracing::instrument(
    "Creating formation",
    skip(pool, body, _admin)
)]
pub async fn post_formation(
    pool: web::Data<DbPool>,
    body: web::Json<NewFormation>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let formation = insert_formation(conn, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(formation))
}

#[tracing::instrument(
    "Updating formation",
    skip(pool, body, _admin)
)]
pub async fn put_formation(
    pool: web::Data<DbPool>,
    formation_id: web::Path<Uuid>,
    body: web::Json<FormationUpdate>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let formation = update_formation(conn, formation_id.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(formation))
}

#[tracing::instrument(
    "Soft deleting formation",
    skip(pool, _admin)
)]
pub async fn delete_formation(
    pool: web::Data<DbPool>,
    formation_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    set_formation_deleted(conn, formation_id.into_inner(), true).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(
    "Purging formation",
    skip(pool, _admin)
)]
pub async fn purge_formation_route(
    pool: web::Data<DbPool>,
    formation_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    purge_formation(conn, formation_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
