use diesel::{dsl::sql, prelude::*, sql_types::BigInt};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{listing::PropertyCard, status::{OrderStatus, PaymentStatus}},
    schema::{formations, orders, properties},
    utils::{DbConnection, Pagination},
};

use super::{load_property_cards, load_upcoming_sessions, with_connection, PropertyFilter, QueryError, UpcomingSession};

pub const HOME_SECTION_SIZE: i64 = 6;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats{
    pub active_properties: i64,
    pub published_formations: i64,
    pub pending_orders: i64,
    pub paid_total_cents: i64,
    pub paid_total_label: String
}

#[tracing::instrument("Counting active properties", skip(conn))]
pub async fn count_active_properties(conn: DbConnection) -> Result<i64, QueryError>{
    with_connection(conn, |conn| {
        Ok(properties::table
            .filter(properties::deleted_at.is_null())
            .count()
            .get_result::<i64>(conn)?)
    })
    .await
}

#[tracing::instrument("Counting published formations", skip(conn))]
pub async fn count_published_formations(conn: DbConnection) -> Result<i64, QueryError>{
    with_connection(conn, |conn| {
        Ok(formations::table
            .filter(formations::deleted_at.is_null())
            .filter(formations::is_published.eq(true))
            .count()
            .get_result::<i64>(conn)?)
    })
    .await
}

#[tracing::instrument("Counting pending orders", skip(conn))]
pub async fn count_pending_orders(conn: DbConnection) -> Result<i64, QueryError>{
    with_connection(conn, |conn| {
        Ok(orders::table
            .filter(orders::status.eq(OrderStatus::Pending.as_str()))
            .count()
            .get_result::<i64>(conn)?)
    })
    .await
}

#[tracing::instrument("Summing paid orders", skip(conn))]
pub async fn total_paid_cents(conn: DbConnection) -> Result<i64, QueryError>{
    with_connection(conn, |conn| {
        // SUM(bigint) is numeric in postgres
        Ok(orders::table
            .filter(orders::payment_status.eq(PaymentStatus::Paid.as_str()))
            .select(sql::<BigInt>("COALESCE(SUM(total_cents), 0)::BIGINT"))
            .first::<i64>(conn)?)
    })
    .await
}

#[tracing::instrument("Getting featured properties", skip(conn))]
pub async fn featured_property_cards(conn: DbConnection) -> Result<Vec<PropertyCard>, QueryError>{
    with_connection(conn, |conn| {
        let filter = PropertyFilter{
            featured: Some(true),
            ..Default::default()
        };
        let (cards, _) = load_property_cards(conn, &filter, Pagination::new(Some(1), Some(HOME_SECTION_SIZE)))?;
        Ok(cards)
    })
    .await
}

#[tracing::instrument("Getting upcoming sessions", skip(conn))]
pub async fn upcoming_sessions(conn: DbConnection) -> Result<Vec<UpcomingSession>, QueryError>{
    with_connection(conn, |conn| Ok(load_upcoming_sessions(conn, HOME_SECTION_SIZE)?)).await
}
