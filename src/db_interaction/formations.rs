use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use diesel::{dsl::{exists, min}, pg::Pg, prelude::*};
use diesel::result::Error as DieselError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{listing::{FormationCard, FormationDetail, SessionView}, slug::slugify},
    models::{Formation, FormationChangeset, FormationSession, SessionChangeset},
    schema::{formation_sessions, formations},
    utils::{escape_like, like_pattern, DbConnection, Pagination},
};

use super::{is_unique_violation, unique_slug, with_connection, QueryError};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct FormationFilter{
    pub category: Option<String>,
    pub q: Option<String>,
    // Only honoured on the admin listing
    #[serde(default)]
    pub include_unpublished: bool,
    #[serde(default)]
    pub include_deleted: bool
}

fn filtered_query(filter: &FormationFilter) -> formations::BoxedQuery<'static, Pg>{
    let mut query = formations::table.into_boxed();

    if !filter.include_deleted {
        query = query.filter(formations::deleted_at.is_null());
    }
    if !filter.include_unpublished {
        query = query.filter(formations::is_published.eq(true));
    }
    if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        query = query.filter(formations::category.ilike(escape_like(category)));
    }
    if let Some(term) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(term);
        query = query.filter(
            formations::title.ilike(pattern.clone())
                .or(formations::summary.ilike(pattern))
        );
    }

    query
}

fn today() -> NaiveDate{
    Utc::now().date_naive()
}

#[tracing::instrument(
    "Getting formation catalog",
    skip(conn)
)]
pub async fn list_formation_cards(
    conn: DbConnection,
    filter: FormationFilter,
    pagination: Pagination
) -> Result<(Vec<FormationCard>, i64), QueryError>{
    with_connection(conn, move |conn| {
        let total = filtered_query(&filter)
            .count()
            .get_result::<i64>(conn)?;

        let rows = filtered_query(&filter)
            .order((formations::title.asc(), formations::formation_id.asc()))
            .select(Formation::as_select())
            .limit(pagination.limit)
            .offset(pagination.offset())
            .load::<Formation>(conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|f| f.formation_id).collect();
        let next_sessions: HashMap<Uuid, Option<NaiveDate>> = formation_sessions::table
            .filter(formation_sessions::formation_id.eq_any(ids))
            .filter(formation_sessions::starts_on.ge(today()))
            .group_by(formation_sessions::formation_id)
            .select((formation_sessions::formation_id, min(formation_sessions::starts_on)))
            .load::<(Uuid, Option<NaiveDate>)>(conn)?
            .into_iter()
            .collect();

        let cards = rows.into_iter()
            .map(|formation| {
                let next = next_sessions.get(&formation.formation_id).copied().flatten();
                FormationCard::from_row(formation, next)
            })
            .collect();

        Ok((cards, total))
    })
    .await
}

fn load_sessions(
    conn: &mut DbConnection,
    formation_id: Uuid,
    upcoming_only: bool
) -> Result<Vec<FormationSession>, DieselError>{
    let mut query = formation_sessions::table
        .filter(formation_sessions::formation_id.eq(formation_id))
        .into_boxed();

    if upcoming_only {
        query = query.filter(formation_sessions::starts_on.ge(today()));
    }

    query.order(formation_sessions::starts_on.asc())
        .select(FormationSession::as_select())
        .load::<FormationSession>(conn)
}

fn find_formation(conn: &mut DbConnection, formation_id: Uuid) -> Result<Formation, QueryError>{
    formations::table
        .find(formation_id)
        .select(Formation::as_select())
        .first::<Formation>(conn)
        .map_err(QueryError::not_found_as("formation"))
}

#[tracing::instrument(
    "Getting formation by slug",
    skip(conn)
)]
pub async fn get_formation_by_slug(
    conn: DbConnection,
    slug: String
) -> Result<FormationDetail, QueryError>{
    with_connection(conn, move |conn| {
        let formation = formations::table
            .filter(formations::slug.eq(slug))
            .filter(formations::deleted_at.is_null())
            .filter(formations::is_published.eq(true))
            .select(Formation::as_select())
            .first::<Formation>(conn)
            .map_err(QueryError::not_found_as("formation"))?;

        let sessions = load_sessions(conn, formation.formation_id, true)?;
        Ok(FormationDetail::new(formation, sessions))
    })
    .await
}

#[tracing::instrument(
    "Getting formation by id",
    skip(conn)
)]
pub async fn get_formation_by_id(
    conn: DbConnection,
    formation_id: Uuid
) -> Result<FormationDetail, QueryError>{
    with_connection(conn, move |conn| {
        let formation = find_formation(conn, formation_id)?;
        let sessions = load_sessions(conn, formation_id, false)?;
        Ok(FormationDetail::new(formation, sessions))
    })
    .await
}

#[derive(Serialize, Deserialize, Debug)]
pub struct UpcomingSession{
    pub formation_slug: String,
    pub formation_title: String,
    #[serde(flatten)]
    pub session: SessionView
}

pub fn load_upcoming_sessions(conn: &mut DbConnection, limit: i64) -> Result<Vec<UpcomingSession>, DieselError>{
    let rows = formation_sessions::table
        .inner_join(formations::table)
        .filter(formations::deleted_at.is_null())
        .filter(formations::is_published.eq(true))
        .filter(formation_sessions::starts_on.ge(today()))
        .order(formation_sessions::starts_on.asc())
        .limit(limit)
        .select((FormationSession::as_select(), Formation::as_select()))
        .load::<(FormationSession, Formation)>(conn)?;

    Ok(rows.into_iter()
        .map(|(session, formation)| UpcomingSession{
            session: SessionView::new(&session, formation.price_cents),
            formation_slug: formation.slug,
            formation_title: formation.title
        })
        .collect())
}

#[derive(Deserialize, Debug)]
pub struct NewFormation{
    pub title: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub duration_hours: Option<i32>,
    pub price_cents: i64,
    pub prerequisites: Option<String>,
    pub program: Option<String>,
    #[serde(default)]
    pub is_published: bool
}

#[derive(Deserialize, Debug, Default)]
pub struct FormationUpdate{
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_hours: Option<i32>,
    pub price_cents: Option<i64>,
    pub prerequisites: Option<String>,
    pub program: Option<String>,
    pub is_published: Option<bool>,
    #[serde(default)]
    pub regenerate_slug: bool
}

fn validate_formation(title: Option<&str>, price_cents: Option<i64>, duration_hours: Option<i32>) -> Result<(), QueryError>{
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(QueryError::Invalid("title must not be empty".to_string()));
    }
    if price_cents.is_some_and(|p| p < 0) {
        return Err(QueryError::Invalid("price must not be negative".to_string()));
    }
    if duration_hours.is_some_and(|d| d <= 0) {
        return Err(QueryError::Invalid("duration must be positive".to_string()));
    }
    Ok(())
}

pub fn formation_slug_taken(conn: &mut DbConnection, slug: &str) -> Result<bool, DieselError>{
    diesel::select(exists(formations::table.filter(formations::slug.eq(slug))))
        .get_result::<bool>(conn)
}

fn map_slug_conflict(e: DieselError) -> QueryError{
    if is_unique_violation(&e) {
        QueryError::Conflict("slug is already used".to_string())
    } else {
        e.into()
    }
}

#[tracing::instrument(
    "Inserting formation",
    skip(conn, new_formation),
    fields(title = %new_formation.title)
)]
pub async fn insert_formation(
    conn: DbConnection,
    new_formation: NewFormation
) -> Result<Formation, QueryError>{
    validate_formation(Some(&new_formation.title), Some(new_formation.price_cents), new_formation.duration_hours)?;

    with_connection(conn, move |conn| {
        let slug = unique_slug(conn, &new_formation.title, formation_slug_taken)?;
        let now = Utc::now();

        let formation = Formation{
            formation_id: Uuid::new_v4(),
            slug,
            title: new_formation.title.trim().to_string(),
            summary: new_formation.summary,
            description: new_formation.description,
            category: new_formation.category,
            duration_hours: new_formation.duration_hours,
            price_cents: new_formation.price_cents,
            prerequisites: new_formation.prerequisites,
            program: new_formation.program,
            is_published: new_formation.is_published,
            created_at: now,
            updated_at: now,
            deleted_at: None
        };

        diesel::insert_into(formations::table)
            .values(&formation)
            .execute(conn)
            .map_err(map_slug_conflict)?;

        Ok(formation)
    })
    .await
}

#[tracing::instrument(
    "Updating formation",
    skip(conn, update)
)]
pub async fn update_formation(
    conn: DbConnection,
    formation_id: Uuid,
    update: FormationUpdate
) -> Result<Formation, QueryError>{
    validate_formation(update.title.as_deref(), update.price_cents, update.duration_hours)?;

    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let current = find_formation(conn, formation_id)?;

            let slug = match (&update.title, update.regenerate_slug) {
                (Some(title), true) if slugify(title) != current.slug => {
                    Some(unique_slug(conn, title, formation_slug_taken)?)
                },
                _ => None
            };

            let changes = FormationChangeset{
                slug,
                title: update.title.map(|t| t.trim().to_string()),
                summary: update.summary,
                description: update.description,
                category: update.category,
                duration_hours: update.duration_hours,
                price_cents: update.price_cents,
                prerequisites: update.prerequisites,
                program: update.program,
                is_published: update.is_published,
                updated_at: Some(Utc::now())
            };

            diesel::update(formations::table.find(formation_id))
                .set(&changes)
                .returning(Formation::as_returning())
                .get_result::<Formation>(conn)
                .map_err(map_slug_conflict)
        })
    })
    .await
}

#[tracing::instrument(
    "Setting formation deleted_at",
    skip(conn)
)]
pub async fn set_formation_deleted(
    conn: DbConnection,
    formation_id: Uuid,
    deleted: bool
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        let deleted_at = if deleted { Some(Utc::now()) } else { None };

        let affected_rows = diesel::update(formations::table.find(formation_id))
            .set((
                formations::deleted_at.eq(deleted_at),
                formations::updated_at.eq(Utc::now())
            ))
            .execute(conn)?;

        if affected_rows == 0 {
            return Err(QueryError::NotFound("formation"));
        }

        Ok(())
    })
    .await
}

#[tracing::instrument(
    "Purging formation",
    skip(conn)
)]
pub async fn purge_formation(
    conn: DbConnection,
    formation_id: Uuid
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        let affected_rows = diesel::delete(formations::table.find(formation_id))
            .execute(conn)?;

        if affected_rows == 0 {
            return Err(QueryError::NotFound("formation"));
        }

        Ok(())
    })
    .await
}

#[derive(Deserialize, Debug)]
pub struct NewSession{
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub city: String,
    pub address: Option<String>,
    pub seats_total: i32,
    pub price_cents: Option<i64>
}

fn validate_session(
    starts_on: Option<NaiveDate>,
    ends_on: Option<NaiveDate>,
    seats_total: Option<i32>,
    price_cents: Option<i64>
) -> Result<(), QueryError>{
    if seats_total.is_some_and(|s| s < 1) {
        return Err(QueryError::Invalid("a session needs at least one seat".to_string()));
    }
    if let (Some(start), Some(end)) = (starts_on, ends_on) {
        if end < start {
            return Err(QueryError::Invalid("a session cannot end before it starts".to_string()));
        }
    }
    if price_cents.is_some_and(|p| p < 0) {
        return Err(QueryError::Invalid("price must not be negative".to_string()));
    }
    Ok(())
}

#[tracing::instrument(
    "Inserting formation session",
    skip(conn)
)]
pub async fn insert_session(
    conn: DbConnection,
    formation_id: Uuid,
    new_session: NewSession
) -> Result<FormationSession, QueryError>{
    validate_session(Some(new_session.starts_on), new_session.ends_on, Some(new_session.seats_total), new_session.price_cents)?;
    if new_session.city.trim().is_empty() {
        return Err(QueryError::Invalid("city must not be empty".to_string()));
    }

    with_connection(conn, move |conn| {
        find_formation(conn, formation_id)?;

        let session = FormationSession{
            session_id: Uuid::new_v4(),
            formation_id,
            starts_on: new_session.starts_on,
            ends_on: new_session.ends_on,
            city: new_session.city.trim().to_string(),
            address: new_session.address,
            seats_total: new_session.seats_total,
            seats_taken: 0,
            price_cents: new_session.price_cents,
            created_at: Utc::now()
        };

        diesel::insert_into(formation_sessions::table)
            .values(&session)
            .execute(conn)?;

        Ok(session)
    })
    .await
}

fn find_session(conn: &mut DbConnection, session_id: Uuid) -> Result<FormationSession, QueryError>{
    formation_sessions::table
        .find(session_id)
        .select(FormationSession::as_select())
        .first::<FormationSession>(conn)
        .map_err(QueryError::not_found_as("session"))
}

#[tracing::instrument(
    "Updating formation session",
    skip(conn)
)]
pub async fn update_session(
    conn: DbConnection,
    session_id: Uuid,
    changes: SessionChangeset
) -> Result<FormationSession, QueryError>{
    validate_session(changes.starts_on, changes.ends_on, changes.seats_total, changes.price_cents)?;

    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let current = find_session(conn, session_id)?;

            if let Some(seats_total) = changes.seats_total {
                if seats_total < current.seats_taken {
                    return Err(QueryError::Conflict(format!(
                        "{} seats are already reserved", current.seats_taken
                    )));
                }
            }
            let starts_on = changes.starts_on.unwrap_or(current.starts_on);
            if changes.ends_on.or(current.ends_on).is_some_and(|end| end < starts_on) {
                return Err(QueryError::Invalid("a session cannot end before it starts".to_string()));
            }

            let nothing_to_change = changes.starts_on.is_none()
                && changes.ends_on.is_none()
                && changes.city.is_none()
                && changes.address.is_none()
                && changes.seats_total.is_none()
                && changes.price_cents.is_none();
            if nothing_to_change {
                return Ok(current);
            }

            Ok(diesel::update(formation_sessions::table.find(session_id))
                .set(&changes)
                .returning(FormationSession::as_returning())
                .get_result::<FormationSession>(conn)?)
        })
    })
    .await
}

#[tracing::instrument(
    "Deleting formation session",
    skip(conn)
)]
pub async fn delete_session(
    conn: DbConnection,
    session_id: Uuid
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let current = find_session(conn, session_id)?;
            if current.seats_taken > 0 {
                return Err(QueryError::Conflict(
                    "the session has reservations, cancel its orders first".to_string()
                ));
            }

            diesel::delete(formation_sessions::table.find(session_id))
                .execute(conn)?;

            Ok(())
        })
    })
    .await
}
