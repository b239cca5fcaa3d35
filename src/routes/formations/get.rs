use actix_web::{web, HttpResponse};

use crate::{
    db_interaction::{get_formation_by_slug, list_formation_cards, FormationFilter},
    routes::ApiError,
    utils::{get_pooled_connection, DbPool, Page, PageQuery, Pagination},
};

#[tracing::instrument(
    "Listing formation catalog",
    skip(pool)
)]
pub async fn get_formations(
    pool: web::Data<DbPool>,
    filter: web::Query<FormationFilter>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let mut filter = filter.into_inner();
    filter.include_deleted = false;
    filter.include_unpublished = false;

    let pagination = Pagination::from(page.into_inner());
    let conn = get_pooled_connection(&pool).await?;

    let (cards, total) = list_formation_cards(conn, filter, pagination).await?;

    Ok(HttpResponse::Ok().json(Page::new(cards, total, pagination)))
}

#[tracing::instrument(
    "Getting formation detail",
    skip(pool)
)]
pub async fn get_formation(
    pool: web::Data<DbPool>,
    slug: web::Path<String>
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let detail = get_formation_by_slug(conn, slug.into_inner()).await?;

    Ok(HttpResponse::Ok().json(detail))
}
