use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{add_property_image, remove_property_image, reorder_property_images, NewPropertyImage},
    routes::ApiError,
    utils::{get_pooled_connection, DbPool},
};

#[derive(Deserialize, Debug)]
pub struct ImageOrder{
    pub image_ids: Vec<Uuid>
}

#[tracing::instrument(
    "Adding image to property gallery",
    skip(pool, _admin)
)]
pub async fn post_property_image(
    pool: web::Data<DbPool>,
    property_id: web::Path<Uuid>,
    body: web::Json<NewPropertyImage>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let image = add_property_image(conn, property_id.into_inner(), body.into_inner()).await?;

    Ok(HttpResponse::Created().json(image))
}

#[tracing::instrument(
    "Removing image from property gallery",
    skip(pool, _admin)
)]
pub async fn delete_property_image(
    pool: web::Data<DbPool>,
    path: web::Path<(Uuid, Uuid)>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let (property_id, image_id) = path.into_inner();
    let conn = get_pooled_connection(&pool).await?;

    let remaining = remove_property_image(conn, property_id, image_id).await?;

    Ok(HttpResponse::Ok().json(remaining))
}

#[tracing::instrument(
    "Reordering property gallery",
    skip(pool, _admin)
)]
pub async fn put_property_image_order(
    pool: web::Data<DbPool>,
    property_id: web::Path<Uuid>,
    body: web::Json<ImageOrder>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let images = reorder_property_images(conn, property_id.into_inner(), body.into_inner().image_ids).await?;

    Ok(HttpResponse::Ok().json(images))
}
