use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::extractors::IsUser,
    db_interaction::{list_notifications, mark_all_notifications_read, mark_notification_read},
    utils::{get_pooled_connection, DbPool, Pagination},
};

use super::ApiError;

#[derive(Deserialize, Debug, Default)]
pub struct NotificationQuery{
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>
}

#[tracing::instrument(
    "Getting notifications",
    skip(pool, uid)
)]
pub async fn get_notifications(
    pool: web::Data<DbPool>,
    query: web::Query<NotificationQuery>,
    uid: IsUser
) -> Result<HttpResponse, ApiError>{
    let pagination = Pagination::new(query.page, query.limit);
    let conn = get_pooled_connection(&pool).await?;

    let notifications = list_notifications(conn, uid.0, query.unread_only, pagination).await?;

    Ok(HttpResponse::Ok().json(notifications))
}

#[tracing::instrument(
    "Marking notification read",
    skip(pool, uid)
)]
pub async fn read_notification(
    pool: web::Data<DbPool>,
    notification_id: web::Path<Uuid>,
    uid: IsUser
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    mark_notification_read(conn, uid.0, notification_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[tracing::instrument(
    "Marking all notifications read",
    skip(pool, uid)
)]
pub async fn read_all_notifications(
    pool: web::Data<DbPool>,
    uid: IsUser
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let updated = mark_all_notifications_read(conn, uid.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}
