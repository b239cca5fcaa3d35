use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::extractors::{IsAdmin, IsUser},
    db_interaction::{get_order_by_reference, get_order_with_items, list_orders, OrderFilter},
    routes::ApiError,
    utils::{get_pooled_connection, DbPool, Page, PageQuery, Pagination},
};

#[derive(Deserialize, Debug)]
pub struct ReferenceQuery{
    pub email: String
}

#[tracing::instrument(
    "Getting orders of logged in user",
    skip(pool, uid)
)]
pub async fn get_user_orders(
    pool: web::Data<DbPool>,
    page: web::Query<PageQuery>,
    uid: IsUser
) -> Result<HttpResponse, ApiError> {
    let pagination = Pagination::from(page.into_inner());
    let conn = get_pooled_connection(&pool).await?;

    let (orders, total) = list_orders(conn, OrderFilter::default(), pagination, Some(uid.0)).await?;

    Ok(HttpResponse::Ok().json(Page::new(orders, total, pagination)))
}

#[tracing::instrument(
    "Getting order summary by reference",
    skip(pool, query)
)]
pub async fn get_checkout_order(
    pool: web::Data<DbPool>,
    reference: web::Path<String>,
    query: web::Query<ReferenceQuery>
) -> Result<HttpResponse, ApiError> {
    let conn = get_pooled_connection(&pool).await?;

    let order = get_order_by_reference(conn, reference.into_inner(), query.into_inner().email).await?;

    Ok(HttpResponse::Ok().json(order))
}

#[tracing::instrument(
    "Admin listing of orders",
    skip(pool, _admin)
)]
pub async fn admin_get_orders(
    pool: web::Data<DbPool>,
    filter: web::Query<OrderFilter>,
    page: web::Query<PageQuery>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError> {
    let pagination = Pagination::from(page.into_inner());
    let conn = get_pooled_connection(&pool).await?;

    let (orders, total) = list_orders(conn, filter.into_inner(), pagination, None).await?;

    Ok(HttpResponse::Ok().json(Page::new(orders, total, pagination)))
}

#[tracing::instrument(
    "Admin order detail",
    skip(pool, _admin)
)]
pub async fn admin_get_order(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError> {
    let conn = get_pooled_connection(&pool).await?;

    let order = get_order_with_items(conn, order_id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(order))
}
