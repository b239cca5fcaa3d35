// View models built from database rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Agent, Formation, FormationSession, Property, PropertyImage};

use super::{price::{format_amount, format_price}, status::TransactionType};

fn price_label(property: &Property) -> String {
    // Rows are written through TransactionType, unknown text is shown as a sale
    let transaction = property.transaction_type
        .parse::<TransactionType>()
        .unwrap_or(TransactionType::Sale);
    format_price(property.price_cents, transaction)
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PropertyCard{
    pub property_id: Uuid,
    pub slug: String,
    pub title: String,
    pub city: String,
    pub property_type: String,
    pub transaction_type: String,
    pub price_cents: i64,
    pub price_label: String,
    pub surface_m2: Option<f64>,
    pub rooms: Option<i32>,
    pub bedrooms: Option<i32>,
    pub cover_image_url: Option<String>,
    pub agent_name: Option<String>,
    pub is_featured: bool
}

impl PropertyCard {
    pub fn from_row(property: Property, cover: Option<&PropertyImage>, agent_name: Option<String>) -> Self{
        let price_label = price_label(&property);

        Self{
            property_id: property.property_id,
            slug: property.slug,
            title: property.title,
            city: property.city,
            property_type: property.property_type,
            transaction_type: property.transaction_type,
            price_cents: property.price_cents,
            price_label,
            surface_m2: property.surface_m2,
            rooms: property.rooms,
            bedrooms: property.bedrooms,
            cover_image_url: cover.map(|image| image.url.clone()),
            agent_name,
            is_featured: property.is_featured
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PropertyDetail{
    #[serde(flatten)]
    pub property: Property,
    pub price_label: String,
    pub images: Vec<PropertyImage>,
    pub agent: Option<Agent>
}

impl PropertyDetail {
    pub fn new(property: Property, mut images: Vec<PropertyImage>, agent: Option<Agent>) -> Self{
        images.sort_by_key(|image| image.position);
        let price_label = price_label(&property);

        Self{ property, price_label, images, agent }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionView{
    pub session_id: Uuid,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub city: String,
    pub address: Option<String>,
    pub seats_total: i32,
    pub seats_left: i32,
    pub price_cents: i64,
    pub price_label: String
}

impl SessionView {
    pub fn new(session: &FormationSession, formation_price_cents: i64) -> Self{
        let price_cents = session.price_cents.unwrap_or(formation_price_cents);

        Self{
            session_id: session.session_id,
            starts_on: session.starts_on,
            ends_on: session.ends_on,
            city: session.city.clone(),
            address: session.address.clone(),
            seats_total: session.seats_total,
            seats_left: session.seats_left(),
            price_cents,
            price_label: format_amount(price_cents)
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FormationCard{
    pub formation_id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub duration_hours: Option<i32>,
    pub price_cents: i64,
    pub price_label: String,
    pub next_session_on: Option<NaiveDate>
}

impl FormationCard {
    pub fn from_row(formation: Formation, next_session_on: Option<NaiveDate>) -> Self{
        Self{
            formation_id: formation.formation_id,
            slug: formation.slug,
            title: formation.title,
            summary: formation.summary,
            category: formation.category,
            duration_hours: formation.duration_hours,
            price_label: format_amount(formation.price_cents),
            price_cents: formation.price_cents,
            next_session_on
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct FormationDetail{
    #[serde(flatten)]
    pub formation: Formation,
    pub price_label: String,
    pub sessions: Vec<SessionView>
}

impl FormationDetail {
    pub fn new(formation: Formation, mut sessions: Vec<FormationSession>) -> Self{
        sessions.sort_by_key(|session| session.starts_on);
        let sessions = sessions.iter()
            .map(|session| SessionView::new(session, formation.price_cents))
            .collect();

        Self{
            price_label: format_amount(formation.price_cents),
            formation,
            sessions
        }
    }
}
