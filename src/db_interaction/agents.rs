use chrono::Utc;
use diesel::{dsl::exists, ExpressionMethods, OptionalExtension, QueryDsl, RunQueryDsl, SelectableHelper};
use serde::Deserialize;
use uuid::Uuid;

use crate::{models::{Agent, AgentChangeset}, schema::agents, utils::{DbConnection, Pagination}};

use super::{is_unique_violation, unique_slug, with_connection, QueryError};

#[derive(Deserialize, Debug)]
pub struct NewAgent{
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub agency: Option<String>
}

pub fn agent_slug_taken(conn: &mut DbConnection, slug: &str) -> Result<bool, diesel::result::Error>{
    diesel::select(exists(agents::table.filter(agents::slug.eq(slug))))
        .get_result::<bool>(conn)
}

#[tracing::instrument(
    "Getting agents from db",
    skip(conn)
)]
pub async fn list_agents(
    conn: DbConnection,
    pagination: Pagination
) -> Result<(Vec<Agent>, i64), QueryError>{
    with_connection(conn, move |conn| {
        let total = agents::table
            .count()
            .get_result::<i64>(conn)?;

        let rows = agents::table
            .select(Agent::as_select())
            .order(agents::full_name.asc())
            .limit(pagination.limit)
            .offset(pagination.offset())
            .load::<Agent>(conn)?;

        Ok((rows, total))
    })
    .await
}

#[tracing::instrument(
    "Getting agent by slug",
    skip(conn)
)]
pub async fn get_agent_by_slug(
    conn: DbConnection,
    slug: String
) -> Result<Agent, QueryError>{
    with_connection(conn, move |conn| {
        agents::table
            .filter(agents::slug.eq(slug))
            .select(Agent::as_select())
            .first::<Agent>(conn)
            .map_err(QueryError::not_found_as("agent"))
    })
    .await
}

pub fn find_agent(conn: &mut DbConnection, agent_id: Uuid) -> Result<Option<Agent>, diesel::result::Error>{
    agents::table
        .find(agent_id)
        .select(Agent::as_select())
        .first::<Agent>(conn)
        .optional()
}

#[tracing::instrument(
    "Inserting agent",
    skip(conn)
)]
pub async fn insert_agent(
    conn: DbConnection,
    new_agent: NewAgent
) -> Result<Agent, QueryError>{
    with_connection(conn, move |conn| {
        let slug = unique_slug(conn, &new_agent.full_name, agent_slug_taken)?;

        let agent = Agent{
            agent_id: Uuid::new_v4(),
            slug,
            full_name: new_agent.full_name,
            email: new_agent.email,
            phone: new_agent.phone,
            bio: new_agent.bio,
            photo_url: new_agent.photo_url,
            agency: new_agent.agency,
            created_at: Utc::now()
        };

        diesel::insert_into(agents::table)
            .values(&agent)
            .execute(conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    QueryError::Conflict(format!("slug {} is already used", agent.slug))
                } else {
                    e.into()
                }
            })?;

        Ok(agent)
    })
    .await
}

#[tracing::instrument(
    "Updating agent",
    skip(conn, changes)
)]
pub async fn update_agent(
    conn: DbConnection,
    agent_id: Uuid,
    changes: AgentChangeset
) -> Result<Agent, QueryError>{
    with_connection(conn, move |conn| {
        if changes_are_empty(&changes) {
            return find_agent(conn, agent_id)?
                .ok_or(QueryError::NotFound("agent"));
        }

        diesel::update(agents::table.find(agent_id))
            .set(&changes)
            .returning(Agent::as_returning())
            .get_result::<Agent>(conn)
            .map_err(QueryError::not_found_as("agent"))
    })
    .await
}

// diesel refuses an UPDATE without any column
fn changes_are_empty(changes: &AgentChangeset) -> bool{
    changes.full_name.is_none()
        && changes.email.is_none()
        && changes.phone.is_none()
        && changes.bio.is_none()
        && changes.photo_url.is_none()
        && changes.agency.is_none()
}

#[tracing::instrument(
    "Deleting agent",
    skip(conn)
)]
pub async fn delete_agent(
    conn: DbConnection,
    agent_id: Uuid
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        let affected_rows = diesel::delete(agents::table.find(agent_id))
            .execute(conn)?;

        if affected_rows == 0 {
            return Err(QueryError::NotFound("agent"));
        }

        Ok(())
    })
    .await
}
