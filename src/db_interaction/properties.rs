use std::collections::{HashMap, HashSet};

use chrono::Utc;
use diesel::{dsl::exists, pg::Pg, prelude::*};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{listing::{PropertyCard, PropertyDetail}, slug::slugify, status::{PropertyType, TransactionType}},
    models::{Agent, Property, PropertyChangeset, PropertyImage},
    schema::{agents, properties, property_images},
    utils::{escape_like, like_pattern, DbConnection, Pagination},
};

use super::{find_agent, is_unique_violation, unique_slug, with_connection, QueryError};

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PropertySort{
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    SurfaceDesc
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PropertyFilter{
    pub transaction: Option<TransactionType>,
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_rooms: Option<i32>,
    pub min_surface: Option<f64>,
    pub q: Option<String>,
    pub featured: Option<bool>,
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub sort: PropertySort,
    // Only honoured on the admin listing
    #[serde(default)]
    pub include_deleted: bool
}

fn non_blank(value: &Option<String>) -> Option<&str>{
    value.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn filtered_query(filter: &PropertyFilter) -> properties::BoxedQuery<'static, Pg>{
    let mut query = properties::table.into_boxed();

    if !filter.include_deleted {
        query = query.filter(properties::deleted_at.is_null());
    }
    if let Some(transaction) = filter.transaction {
        query = query.filter(properties::transaction_type.eq(transaction.as_str()));
    }
    if let Some(property_type) = filter.property_type {
        query = query.filter(properties::property_type.eq(property_type.as_str()));
    }
    if let Some(city) = non_blank(&filter.city) {
        query = query.filter(properties::city.ilike(escape_like(city)));
    }
    if let Some(min_price) = filter.min_price {
        query = query.filter(properties::price_cents.ge(min_price));
    }
    if let Some(max_price) = filter.max_price {
        query = query.filter(properties::price_cents.le(max_price));
    }
    if let Some(min_rooms) = filter.min_rooms {
        query = query.filter(properties::rooms.ge(min_rooms));
    }
    if let Some(min_surface) = filter.min_surface {
        query = query.filter(properties::surface_m2.ge(min_surface));
    }
    if let Some(term) = non_blank(&filter.q) {
        let pattern = like_pattern(term);
        query = query.filter(
            properties::title.ilike(pattern.clone())
                .or(properties::city.ilike(pattern))
        );
    }
    if let Some(featured) = filter.featured {
        query = query.filter(properties::is_featured.eq(featured));
    }
    if let Some(agent_id) = filter.agent_id {
        query = query.filter(properties::agent_id.eq(agent_id));
    }

    query
}

fn sorted(
    query: properties::BoxedQuery<'static, Pg>,
    sort: PropertySort
) -> properties::BoxedQuery<'static, Pg>{
    let query = match sort {
        PropertySort::Newest => query.order(properties::created_at.desc()),
        PropertySort::PriceAsc => query.order(properties::price_cents.asc()),
        PropertySort::PriceDesc => query.order(properties::price_cents.desc()),
        PropertySort::SurfaceDesc => query.order(properties::surface_m2.desc().nulls_last()),
    };

    // Stable pages when the sort key ties
    query.then_order_by(properties::property_id.asc())
}

// Joins covers and agent names onto a page of rows
fn to_cards(conn: &mut DbConnection, rows: Vec<Property>) -> Result<Vec<PropertyCard>, DieselError>{
    let ids: Vec<Uuid> = rows.iter().map(|p| p.property_id).collect();
    let agent_ids: Vec<Uuid> = rows.iter().filter_map(|p| p.agent_id).collect();

    let images = property_images::table
        .filter(property_images::property_id.eq_any(ids))
        .order((property_images::property_id, property_images::position.asc()))
        .select(PropertyImage::as_select())
        .load::<PropertyImage>(conn)?;

    let mut covers: HashMap<Uuid, PropertyImage> = HashMap::new();
    for image in images {
        covers.entry(image.property_id).or_insert(image);
    }

    let agent_names: HashMap<Uuid, String> = agents::table
        .filter(agents::agent_id.eq_any(agent_ids))
        .select((agents::agent_id, agents::full_name))
        .load::<(Uuid, String)>(conn)?
        .into_iter()
        .collect();

    Ok(rows.into_iter()
        .map(|property| {
            let cover = covers.get(&property.property_id);
            let agent_name = property.agent_id.and_then(|id| agent_names.get(&id).cloned());
            PropertyCard::from_row(property, cover, agent_name)
        })
        .collect())
}

pub fn load_property_cards(
    conn: &mut DbConnection,
    filter: &PropertyFilter,
    pagination: Pagination
) -> Result<(Vec<PropertyCard>, i64), DieselError>{
    let total = filtered_query(filter)
        .count()
        .get_result::<i64>(conn)?;

    let rows = sorted(filtered_query(filter), filter.sort)
        .select(Property::as_select())
        .limit(pagination.limit)
        .offset(pagination.offset())
        .load::<Property>(conn)?;

    Ok((to_cards(conn, rows)?, total))
}

#[tracing::instrument(
    "Searching properties",
    skip(conn)
)]
pub async fn list_property_cards(
    conn: DbConnection,
    filter: PropertyFilter,
    pagination: Pagination
) -> Result<(Vec<PropertyCard>, i64), QueryError>{
    with_connection(conn, move |conn| {
        Ok(load_property_cards(conn, &filter, pagination)?)
    })
    .await
}

fn load_images(conn: &mut DbConnection, property_id: Uuid) -> Result<Vec<PropertyImage>, DieselError>{
    property_images::table
        .filter(property_images::property_id.eq(property_id))
        .order(property_images::position.asc())
        .select(PropertyImage::as_select())
        .load::<PropertyImage>(conn)
}

fn find_property(conn: &mut DbConnection, property_id: Uuid) -> Result<Property, QueryError>{
    properties::table
        .find(property_id)
        .select(Property::as_select())
        .first::<Property>(conn)
        .map_err(QueryError::not_found_as("property"))
}

fn detail_of(conn: &mut DbConnection, property: Property) -> Result<PropertyDetail, QueryError>{
    let images = load_images(conn, property.property_id)?;
    let agent: Option<Agent> = match property.agent_id {
        Some(agent_id) => find_agent(conn, agent_id)?,
        None => None
    };

    Ok(PropertyDetail::new(property, images, agent))
}

#[tracing::instrument(
    "Getting property by slug",
    skip(conn)
)]
pub async fn get_property_by_slug(
    conn: DbConnection,
    slug: String
) -> Result<PropertyDetail, QueryError>{
    with_connection(conn, move |conn| {
        let property = properties::table
            .filter(properties::slug.eq(slug))
            .filter(properties::deleted_at.is_null())
            .select(Property::as_select())
            .first::<Property>(conn)
            .map_err(QueryError::not_found_as("property"))?;

        detail_of(conn, property)
    })
    .await
}

#[tracing::instrument(
    "Getting property by id",
    skip(conn)
)]
pub async fn get_property_by_id(
    conn: DbConnection,
    property_id: Uuid
) -> Result<PropertyDetail, QueryError>{
    with_connection(conn, move |conn| {
        let property = find_property(conn, property_id)?;
        detail_of(conn, property)
    })
    .await
}

#[derive(Deserialize, Debug)]
pub struct NewProperty{
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub property_type: PropertyType,
    pub transaction_type: TransactionType,
    pub price_cents: i64,
    pub surface_m2: Option<f64>,
    pub rooms: Option<i32>,
    pub bedrooms: Option<i32>,
    pub address: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_featured: bool,
    pub agent_id: Option<Uuid>
}

#[derive(Deserialize, Debug, Default)]
pub struct PropertyUpdate{
    pub title: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub transaction_type: Option<TransactionType>,
    pub price_cents: Option<i64>,
    pub surface_m2: Option<f64>,
    pub rooms: Option<i32>,
    pub bedrooms: Option<i32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_featured: Option<bool>,
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub regenerate_slug: bool
}

fn validate_listing(title: Option<&str>, city: Option<&str>, price_cents: Option<i64>) -> Result<(), QueryError>{
    if title.is_some_and(|t| t.trim().is_empty()) {
        return Err(QueryError::Invalid("title must not be empty".to_string()));
    }
    if city.is_some_and(|c| c.trim().is_empty()) {
        return Err(QueryError::Invalid("city must not be empty".to_string()));
    }
    if price_cents.is_some_and(|p| p < 0) {
        return Err(QueryError::Invalid("price must not be negative".to_string()));
    }
    Ok(())
}

fn map_write_error(e: DieselError) -> QueryError{
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            QueryError::Invalid("agent does not exist".to_string())
        },
        e if is_unique_violation(&e) => QueryError::Conflict("slug is already used".to_string()),
        e => e.into()
    }
}

pub fn property_slug_taken(conn: &mut DbConnection, slug: &str) -> Result<bool, DieselError>{
    diesel::select(exists(properties::table.filter(properties::slug.eq(slug))))
        .get_result::<bool>(conn)
}

#[tracing::instrument(
    "Inserting property",
    skip(conn, new_property),
    fields(title = %new_property.title)
)]
pub async fn insert_property(
    conn: DbConnection,
    new_property: NewProperty
) -> Result<Property, QueryError>{
    validate_listing(Some(&new_property.title), Some(&new_property.city), Some(new_property.price_cents))?;

    with_connection(conn, move |conn| {
        let slug = unique_slug(conn, &new_property.title, property_slug_taken)?;
        let now = Utc::now();

        let property = Property{
            property_id: Uuid::new_v4(),
            slug,
            title: new_property.title.trim().to_string(),
            description: new_property.description,
            property_type: new_property.property_type.as_str().to_string(),
            transaction_type: new_property.transaction_type.as_str().to_string(),
            price_cents: new_property.price_cents,
            surface_m2: new_property.surface_m2,
            rooms: new_property.rooms,
            bedrooms: new_property.bedrooms,
            address: new_property.address,
            city: new_property.city.trim().to_string(),
            postal_code: new_property.postal_code,
            latitude: new_property.latitude,
            longitude: new_property.longitude,
            is_featured: new_property.is_featured,
            agent_id: new_property.agent_id,
            created_at: now,
            updated_at: now,
            deleted_at: None
        };

        diesel::insert_into(properties::table)
            .values(&property)
            .execute(conn)
            .map_err(map_write_error)?;

        Ok(property)
    })
    .await
}

#[tracing::instrument(
    "Updating property",
    skip(conn, update)
)]
pub async fn update_property(
    conn: DbConnection,
    property_id: Uuid,
    update: PropertyUpdate
) -> Result<Property, QueryError>{
    validate_listing(update.title.as_deref(), update.city.as_deref(), update.price_cents)?;

    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let current = find_property(conn, property_id)?;

            let slug = match (&update.title, update.regenerate_slug) {
                (Some(title), true) if slugify(title) != current.slug => {
                    Some(unique_slug(conn, title, property_slug_taken)?)
                },
                _ => None
            };

            let changes = PropertyChangeset{
                slug,
                title: update.title.map(|t| t.trim().to_string()),
                description: update.description,
                property_type: update.property_type.map(|t| t.as_str().to_string()),
                transaction_type: update.transaction_type.map(|t| t.as_str().to_string()),
                price_cents: update.price_cents,
                surface_m2: update.surface_m2,
                rooms: update.rooms,
                bedrooms: update.bedrooms,
                address: update.address,
                city: update.city.map(|c| c.trim().to_string()),
                postal_code: update.postal_code,
                latitude: update.latitude,
                longitude: update.longitude,
                is_featured: update.is_featured,
                agent_id: update.agent_id,
                updated_at: Some(Utc::now())
            };

            diesel::update(properties::table.find(property_id))
                .set(&changes)
                .returning(Property::as_returning())
                .get_result::<Property>(conn)
                .map_err(map_write_error)
        })
    })
    .await
}

#[tracing::instrument(
    "Setting property deleted_at",
    skip(conn)
)]
pub async fn set_property_deleted(
    conn: DbConnection,
    property_id: Uuid,
    deleted: bool
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        let deleted_at = if deleted { Some(Utc::now()) } else { None };

        let affected_rows = diesel::update(properties::table.find(property_id))
            .set((
                properties::deleted_at.eq(deleted_at),
                properties::updated_at.eq(Utc::now())
            ))
            .execute(conn)?;

        if affected_rows == 0 {
            return Err(QueryError::NotFound("property"));
        }

        Ok(())
    })
    .await
}

#[tracing::instrument(
    "Purging property",
    skip(conn)
)]
pub async fn purge_property(
    conn: DbConnection,
    property_id: Uuid
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        let affected_rows = diesel::delete(properties::table.find(property_id))
            .execute(conn)?;

        if affected_rows == 0 {
            return Err(QueryError::NotFound("property"));
        }

        Ok(())
    })
    .await
}

#[derive(Deserialize, Debug)]
pub struct NewPropertyImage{
    pub url: String,
    pub caption: Option<String>
}

#[tracing::instrument(
    "Adding image to property gallery",
    skip(conn)
)]
pub async fn add_property_image(
    conn: DbConnection,
    property_id: Uuid,
    new_image: NewPropertyImage
) -> Result<PropertyImage, QueryError>{
    if new_image.url.trim().is_empty() {
        return Err(QueryError::Invalid("image url must not be empty".to_string()));
    }

    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            find_property(conn, property_id)?;

            let last_position = property_images::table
                .filter(property_images::property_id.eq(property_id))
                .select(diesel::dsl::max(property_images::position))
                .first::<Option<i32>>(conn)?;

            let image = PropertyImage{
                image_id: Uuid::new_v4(),
                property_id,
                url: new_image.url.trim().to_string(),
                caption: new_image.caption,
                position: last_position.map_or(0, |p| p + 1),
                created_at: Utc::now()
            };

            diesel::insert_into(property_images::table)
                .values(&image)
                .execute(conn)?;

            Ok(image)
        })
    })
    .await
}

// Rewrites positions as 0..n following `ordered_ids`
fn write_positions(conn: &mut DbConnection, ordered_ids: &[Uuid]) -> Result<(), DieselError>{
    for (position, image_id) in ordered_ids.iter().enumerate() {
        diesel::update(property_images::table.find(*image_id))
            .set(property_images::position.eq(position as i32))
            .execute(conn)?;
    }
    Ok(())
}

#[tracing::instrument(
    "Removing image from property gallery",
    skip(conn)
)]
pub async fn remove_property_image(
    conn: DbConnection,
    property_id: Uuid,
    image_id: Uuid
) -> Result<Vec<PropertyImage>, QueryError>{
    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let affected_rows = diesel::delete(
                    property_images::table
                        .filter(property_images::image_id.eq(image_id))
                        .filter(property_images::property_id.eq(property_id))
                )
                .execute(conn)?;

            if affected_rows == 0 {
                return Err(QueryError::NotFound("image"));
            }

            let remaining: Vec<Uuid> = load_images(conn, property_id)?
                .into_iter()
                .map(|image| image.image_id)
                .collect();
            write_positions(conn, &remaining)?;

            Ok(load_images(conn, property_id)?)
        })
    })
    .await
}

pub fn is_permutation(current: &[Uuid], requested: &[Uuid]) -> bool{
    let requested_set: HashSet<&Uuid> = requested.iter().collect();
    let current_set: HashSet<&Uuid> = current.iter().collect();

    requested.len() == current.len()
        && requested_set.len() == requested.len()
        && requested_set == current_set
}

#[tracing::instrument(
    "Reordering property gallery",
    skip(conn)
)]
pub async fn reorder_property_images(
    conn: DbConnection,
    property_id: Uuid,
    ordered_ids: Vec<Uuid>
) -> Result<Vec<PropertyImage>, QueryError>{
    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            find_property(conn, property_id)?;

            let current: Vec<Uuid> = load_images(conn, property_id)?
                .into_iter()
                .map(|image| image.image_id)
                .collect();

            if !is_permutation(&current, &ordered_ids) {
                return Err(QueryError::Invalid(
                    "image order must list every image of the property exactly once".to_string()
                ));
            }

            write_positions(conn, &ordered_ids)?;
            Ok(load_images(conn, property_id)?)
        })
    })
    .await
}
