use actix_web::{web, HttpResponse};

use crate::{
    db_interaction::{get_property_by_slug, get_site_settings, list_property_cards, PropertyFilter},
    routes::ApiError,
    utils::{get_pooled_connection, DbPool, Page, PageQuery, Pagination},
};

#[tracing::instrument(
    "Searching public property listings",
    skip(pool)
)]
pub async fn get_properties(
    pool: web::Data<DbPool>,
    filter: web::Query<PropertyFilter>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let mut filter = filter.into_inner();
    filter.include_deleted = false;

    let limit = match page.limit {
        Some(limit) => limit,
        None => {
            let conn = get_pooled_connection(&pool).await?;
            get_site_settings(conn).await?.listings_per_page
        }
    };
    let pagination = Pagination::new(page.page, Some(limit));

    let conn = get_pooled_connection(&pool).await?;
    let (cards, total) = list_property_cards(conn, filter, pagination).await?;

    Ok(HttpResponse::Ok().json(Page::new(cards, total, pagination)))
}

#[tracing::instrument(
    "Getting property detail",
    skip(pool)
)]
pub async fn get_property(
    pool: web::Data<DbPool>,
    slug: web::Path<String>
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    let detail = get_property_by_slug(conn, slug.into_inner()).await?;

    Ok(HttpResponse::Ok().json(detail))
}
