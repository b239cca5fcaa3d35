use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{update_order_status, update_payment_status},
    domain::status::{OrderStatus, PaymentStatus},
    routes::ApiError,
    utils::{get_pooled_connection, DbPool},
};

#[derive(Deserialize, Debug)]
pub struct UpdateOrderStatusJson{
    pub status: OrderStatus
}

#[derive(Deserialize, Debug)]
pub struct UpdatePaymentStatusJson{
    pub payment_status: PaymentStatus
}

#[tracing::instrument(
    "Updating order status",
    skip(pool, _admin)
)]
pub async fn update_order(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    json: web::Json<UpdateOrderStatusJson>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let order = update_order_status(conn, order_id.into_inner(), json.status).await?;

    Ok(HttpResponse::Ok().json(order))
}

#[tracing::instrument(
    "Updating order payment status",
    skip(pool, _admin)
)]
pub async fn update_order_payment(
    pool: web::Data<DbPool>,
    order_id: web::Path<Uuid>,
    json: web::Json<UpdatePaymentStatusJson>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let order = update_payment_status(conn, order_id.into_inner(), json.payment_status).await?;

    Ok(HttpResponse::Ok().json(order))
}
