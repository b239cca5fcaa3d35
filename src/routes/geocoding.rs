use actix_web::{web, HttpResponse};
use anyhow::Context;
use serde::Deserialize;

use crate::{auth::extractors::IsAdmin, geocoding::GeocodingClient};

use super::ApiError;

#[derive(Deserialize, Debug)]
pub struct AddressQuery{
    pub q: String,
    pub limit: Option<u8>
}

#[tracing::instrument(
    "Searching address suggestions",
    skip(client, _admin)
)]
pub async fn search_address(
    client: web::Data<GeocodingClient>,
    query: web::Query<AddressQuery>,
    _admin: IsAdmin
) -> Result<HttpResponse, ApiError>{
    let suggestions = client.search(&query.q, query.limit)
        .await
        .context("Address search failed")?;

    Ok(HttpResponse::Ok().json(suggestions))
}
