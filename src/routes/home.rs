use actix_web::{web, HttpResponse};
use futures_util::try_join;
use serde::Serialize;

use crate::{
    auth::extractors::IsAdmin,
    db_interaction::{
        count_active_properties, count_pending_orders, count_published_formations,
        featured_property_cards, get_site_settings, total_paid_cents, upcoming_sessions,
        DashboardStats, PublicSettings, UpcomingSession,
    },
    domain::{listing::PropertyCard, price::format_amount},
    utils::{get_pooled_connection, DbConnection, DbPool},
};

use super::ApiError;

#[derive(Serialize, Debug)]
pub struct HomePage{
    pub featured_properties: Vec<PropertyCard>,
    pub upcoming_sessions: Vec<UpcomingSession>,
    pub settings: PublicSettings
}

// One connection per concurrent fetch
async fn connections<const N: usize>(pool: &web::Data<DbPool>) -> Result<[DbConnection; N], ApiError>{
    let mut conns = Vec::with_capacity(N);
    for _ in 0..N {
        conns.push(get_pooled_connection(pool).await?);
    }
    conns.try_into()
        .map_err(|_| ApiError::UnexpectedError(anyhow::anyhow!("Failed to collect pooled connections")))
}

// Everything the home page renders, sent only once every fetch succeeded
#[tracing::instrument(
    "Getting home page",
    skip(pool)
)]
pub async fn get_home(
    pool: web::Data<DbPool>
) -> Result<HttpResponse, ApiError>{
    let [properties_conn, sessions_conn, settings_conn] = connections::<3>(&pool).await?;

    let (featured_properties, upcoming_sessions, settings) = try_join!(
        featured_property_cards(properties_conn),
        upcoming_sessions(sessions_conn),
        get_site_settings(settings_conn)
    )?;

    Ok(HttpResponse::Ok().json(HomePage{
        featured_properties,
        upcoming_sessions,
        settings: settings.into()
    }))
}

#[tracing::instrument(
    "Getting admin dashboard",
    skip(pool, _admin)
)]
pub async fn get_dashboard(
    pool: web::Data<DbPool>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let [properties_conn, formations_conn, pending_conn, paid_conn] = connections::<4>(&pool).await?;

    let (active_properties, published_formations, pending_orders, paid_total_cents) = try_join!(
        count_active_properties(properties_conn),
        count_published_formations(formations_conn),
        count_pending_orders(pending_conn),
        total_paid_cents(paid_conn)
    )?;

    Ok(HttpResponse::Ok().json(DashboardStats{
        active_properties,
        published_formations,
        pending_orders,
        paid_total_cents,
        paid_total_label: format_amount(paid_total_cents)
    }))
}
