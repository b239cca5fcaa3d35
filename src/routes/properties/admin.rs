use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{
        get_property_by_id, insert_property, list_property_cards, purge_property,
        set_property_deleted, update_property, NewProperty, PropertyFilter, PropertyUpdate,
    },
    routes::ApiError,
    utils::{get_pooled_connection, DbPool, Page, PageQuery, Pagination},
};

#[tracing::instrument(
    "Admin listing of properties",
    skip(pool, _admin)
)]
pub async fn admin_get_properties(
    pool: web::Data<DbPool>,
    filter: web::Query<PropertyFilter>,
    page: web::Query<PageQuery>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let pagination = Pagination::from(page.into_inner());
    let conn = get_pooled_connection(&pool).await?;

    let (cards, total) = list_property_cards(conn, filter.into_inner(), pagination).await?;

    Ok(HttpResponse::Ok().json(Page::new(cards, total, pagination)))
}

#[tracing::instrument(
    "Admin property detail",
    skip(pool, _admin)
)]
pub async fn admin_get_property(
    pool: web::Data<DbPool>,
    property_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let detail = get_property_by_id(conn, property_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(detail))
}

#[tracing::instrument(
    "Creating property",
    skip(pool, body, _admin)
)]
pub async fn post_property(
    pool: web::Data<DbPool>,
    body: web::Json<NewProperty>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let property = insert_property(conn, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(property))
}

#[tracing::instrument(
    "Updating property",
    skip(pool, body, _admin)
)]
pub async fn put_property(
    pool: web::Data<DbPool>,
    property_id: web::Path<Uuid>,
    body: web::Json<PropertyUpdate>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let property = update_property(conn, property_id.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(property))
}

#[tracing::instrument(
    "Soft deleting property",
    skip(pool, _admin)
)]
pub async fn delete_property(
    pool: web::Data<DbPool>,
    property_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    set_property_deleted(conn, property_id.into_inner(), true).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(
    "Restoring property",
    skip(pool, _admin)
)]
pub async fn restore_property(
    pool: web::Data<DbPool>,
    property_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    set_property_deleted(conn, property_id.into_inner(), false).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(
    "Purging property",
    skip(pool, _admin)
)]
pub async fn purge_property_route(
    pool: web::Data<DbPool>,
    property_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    purge_property(conn, property_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
