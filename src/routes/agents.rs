use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{delete_agent, get_agent_by_slug, insert_agent, list_agents, list_property_cards, update_agent, NewAgent, PropertyFilter},
    domain::{listing::PropertyCard, user_email::UserEmail},
    models::{Agent, AgentChangeset},
    utils::{get_pooled_connection, DbPool, Page, PageQuery, Pagination},
};

use super::ApiError;

#[derive(Serialize, Debug)]
pub struct AgentDetail{
    #[serde(flatten)]
    pub agent: Agent,
    pub properties: Vec<PropertyCard>
}

#[tracing::instrument(
    "Listing agents",
    skip(pool)
)]
pub async fn get_agents(
    pool: web::Data<DbPool>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let pagination = Pagination::from(page.into_inner());
    let conn = get_pooled_connection(&pool).await?;

    let (agents, total) = list_agents(conn, pagination).await?;

    Ok(HttpResponse::Ok().json(Page::new(agents, total, pagination)))
}

#[tracing::instrument(
    "Getting agent with listings",
    skip(pool)
)]
pub async fn get_agent(
    pool: web::Data<DbPool>,
    slug: web::Path<String>,
    page: web::Query<PageQuery>
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;
    let agent = get_agent_by_slug(conn, slug.into_inner()).await?;

    let filter = PropertyFilter{
        agent_id: Some(agent.agent_id),
        ..Default::default()
    };
    let conn = get_pooled_connection(&pool).await?;
    let (properties, _) = list_property_cards(conn, filter, Pagination::from(page.into_inner())).await?;

    Ok(HttpResponse::Ok().json(AgentDetail{ agent, properties }))
}

fn validate_agent(full_name: Option<&str>, email: Option<String>) -> Result<Option<String>, ApiError>{
    if full_name.is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::BadRequest("full_name must not be empty".to_string()));
    }
    email.map(|email| UserEmail::parse(email).map(|e| e.inner()))
        .transpose()
        .map_err(ApiError::BadRequest)
}

#[tracing::instrument(
    "Creating agent",
    skip(pool, _admin)
)]
pub async fn post_agent(
    pool: web::Data<DbPool>,
    body: web::Json<NewAgent>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let mut new_agent = body.into_inner();
    if let Some(email) = validate_agent(Some(&new_agent.full_name), Some(new_agent.email.clone()))? {
        new_agent.email = email;
    }

    let conn = get_pooled_connection(&pool).await?;
    let agent = insert_agent(conn, new_agent).await?;

    Ok(HttpResponse::Created().json(agent))
}

#[tracing::instrument(
    "Updating agent",
    skip(pool, _admin)
)]
pub async fn put_agent(
    pool: web::Data<DbPool>,
    agent_id: web::Path<Uuid>,
    body: web::Json<AgentChangeset>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let mut changes = body.into_inner();
    changes.email = validate_agent(changes.full_name.as_deref(), changes.email.take())?;

    let conn = get_pooled_connection(&pool).await?;
    let agent = update_agent(conn, agent_id.into_inner(), changes).await?;

    Ok(HttpResponse::Ok().json(agent))
}

#[tracing::instrument(
    "Deleting agent",
    skip(pool, _admin)
)]
pub async fn delete_agent_route(
    pool: web::Data<DbPool>,
    agent_id: web::Path<Uuid>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let conn = get_pooled_connection(&pool).await?;

    delete_agent(conn, agent_id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
